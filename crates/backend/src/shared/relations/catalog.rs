//! Static declaration of the ERP schema
//!
//! Every entity lists its fields (API name, storage column, kind) and the
//! relations that may be eager-loaded from it. The registry is built from
//! this declaration once at startup.

/// Storage kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
}

/// Scalar field of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Name used by the API (camelCase)
    pub name: String,
    /// Column name in the table (snake_case)
    pub column: String,
    pub kind: FieldKind,
}

/// How the rows of a relation are linked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationLink {
    /// This row holds the key of the related row in `local`
    BelongsTo { local: String },
    /// Related rows hold this row's id in `foreign`
    HasMany { foreign: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub name: String,
    /// Canonical name of the target entity
    pub target: String,
    pub link: RelationLink,
}

/// Entity type: one table plus its traversable relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    /// Canonical name (lowercase singular), e.g. `productvariant`
    pub name: String,
    /// Route segment, e.g. `product-variants`
    pub route: String,
    pub table: String,
    pub fields: Vec<FieldDef>,
    pub relations: Vec<RelationDef>,
}

impl EntityDef {
    /// New entity with the base fields `id`, `createdAt`, `updatedAt`
    pub fn new(name: &str, route: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            route: route.to_string(),
            table: table.to_string(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
        .field("id", FieldKind::Text)
        .field("createdAt", FieldKind::Timestamp)
        .field("updatedAt", FieldKind::Timestamp)
    }

    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            column: snake_case(name),
            kind,
        });
        self
    }

    pub fn belongs_to(mut self, name: &str, target: &str, local: &str) -> Self {
        self.relations.push(RelationDef {
            name: name.to_string(),
            target: target.to_string(),
            link: RelationLink::BelongsTo {
                local: local.to_string(),
            },
        });
        self
    }

    pub fn has_many(mut self, name: &str, target: &str, foreign: &str) -> Self {
        self.relations.push(RelationDef {
            name: name.to_string(),
            target: target.to_string(),
            link: RelationLink::HasMany {
                foreign: foreign.to_string(),
            },
        });
        self
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn find_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Fields matched by the free-text heuristic (`search`, `name`, `email`)
    pub fn free_text_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| {
            f.kind == FieldKind::Text && crate::shared::query::date::looks_like_free_text_field(&f.name)
        })
    }
}

/// `orderDate` -> `order_date`
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// The ERP schema served by the dashboard
pub fn erp_entities() -> Vec<EntityDef> {
    use FieldKind::*;

    vec![
        EntityDef::new("user", "users", "users")
            .field("name", Text)
            .field("email", Text)
            .field("roleId", Text)
            .field("status", Text)
            .field("departmentId", Text)
            .field("position", Text)
            .field("salary", Decimal)
            .field("hireDate", Timestamp)
            .field("phone", Text)
            .field("address", Text)
            .field("lastLogin", Timestamp)
            .belongs_to("role", "role", "roleId")
            .belongs_to("department", "department", "departmentId")
            .has_many("managedDepartments", "department", "managerId")
            .has_many("managedProjects", "project", "managerId")
            .has_many("managedWarehouses", "warehouse", "managerId"),
        EntityDef::new("department", "departments", "departments")
            .field("name", Text)
            .field("description", Text)
            .field("budget", Decimal)
            .field("managerId", Text)
            .belongs_to("manager", "user", "managerId")
            .has_many("users", "user", "departmentId")
            .has_many("projects", "project", "departmentId")
            .has_many("roles", "role", "departmentId"),
        EntityDef::new("role", "roles", "roles")
            .field("name", Text)
            .field("description", Text)
            .field("permissions", Text)
            .field("departmentId", Text)
            .belongs_to("department", "department", "departmentId")
            .has_many("users", "user", "roleId"),
        EntityDef::new("project", "projects", "projects")
            .field("name", Text)
            .field("description", Text)
            .field("status", Text)
            .field("priority", Text)
            .field("startDate", Timestamp)
            .field("endDate", Timestamp)
            .field("budget", Decimal)
            .field("departmentId", Text)
            .field("managerId", Text)
            .field("progress", Integer)
            .field("isActive", Boolean)
            .belongs_to("department", "department", "departmentId")
            .belongs_to("manager", "user", "managerId"),
        EntityDef::new("warehouse", "warehouses", "warehouses")
            .field("name", Text)
            .field("code", Text)
            .field("address", Text)
            .field("city", Text)
            .field("state", Text)
            .field("postalCode", Text)
            .field("country", Text)
            .field("phone", Text)
            .field("email", Text)
            .field("managerId", Text)
            .field("capacity", Integer)
            .field("isActive", Boolean)
            .belongs_to("manager", "user", "managerId")
            .has_many("inventory", "inventory", "warehouseId")
            .has_many("inventoryMovements", "inventorymovement", "warehouseId")
            .has_many("transfersFrom", "transfer", "fromWarehouseId")
            .has_many("transfersTo", "transfer", "toWarehouseId")
            .has_many("orders", "order", "warehouseId"),
        EntityDef::new("productcategory", "product-categories", "product_categories")
            .field("name", Text)
            .field("description", Text)
            .field("parentId", Text)
            .belongs_to("parent", "productcategory", "parentId")
            .has_many("children", "productcategory", "parentId")
            .has_many("products", "product", "categoryId"),
        EntityDef::new("supplier", "suppliers", "suppliers")
            .field("name", Text)
            .field("contactPerson", Text)
            .field("email", Text)
            .field("phone", Text)
            .field("address", Text)
            .field("city", Text)
            .field("state", Text)
            .field("postalCode", Text)
            .field("country", Text)
            .field("paymentTerms", Text)
            .field("isActive", Boolean)
            .has_many("products", "product", "supplierId"),
        EntityDef::new("product", "products", "products")
            .field("sku", Text)
            .field("name", Text)
            .field("description", Text)
            .field("categoryId", Text)
            .field("supplierId", Text)
            .field("baseCostPrice", Decimal)
            .field("weight", Decimal)
            .field("dimensions", Text)
            .field("imageUrl", Text)
            .field("isActive", Boolean)
            .belongs_to("category", "productcategory", "categoryId")
            .belongs_to("supplier", "supplier", "supplierId")
            .has_many("variants", "productvariant", "productId"),
        EntityDef::new("productvariant", "product-variants", "product_variants")
            .field("productId", Text)
            .field("sku", Text)
            .field("name", Text)
            .field("size", Text)
            .field("color", Text)
            .field("material", Text)
            .field("model", Text)
            .field("retailPrice", Decimal)
            .field("wholesalePrice", Decimal)
            .field("costPrice", Decimal)
            .field("weight", Decimal)
            .field("dimensions", Text)
            .field("barcode", Text)
            .field("imageUrl", Text)
            .field("isActive", Boolean)
            .belongs_to("product", "product", "productId")
            .has_many("inventory", "inventory", "productVariantId")
            .has_many("inventoryMovements", "inventorymovement", "productVariantId")
            .has_many("transferItems", "transferitem", "productVariantId")
            .has_many("orderItems", "orderitem", "productVariantId"),
        EntityDef::new("inventory", "inventory", "inventory")
            .field("productVariantId", Text)
            .field("warehouseId", Text)
            .field("location", Text)
            .field("quantity", Integer)
            .field("reservedQuantity", Integer)
            .field("reorderPoint", Integer)
            .field("maxStock", Integer)
            .field("lastCountedAt", Timestamp)
            .belongs_to("warehouse", "warehouse", "warehouseId")
            .belongs_to("productVariant", "productvariant", "productVariantId"),
        EntityDef::new("inventorymovement", "inventory-movements", "inventory_movements")
            .field("productVariantId", Text)
            .field("warehouseId", Text)
            .field("movementType", Text)
            .field("quantity", Integer)
            .field("referenceType", Text)
            .field("referenceId", Text)
            .field("notes", Text)
            .field("performedBy", Text)
            .belongs_to("warehouse", "warehouse", "warehouseId")
            .belongs_to("productVariant", "productvariant", "productVariantId")
            .belongs_to("performer", "user", "performedBy"),
        EntityDef::new("transfer", "transfers", "transfers")
            .field("transferNumber", Text)
            .field("fromWarehouseId", Text)
            .field("toWarehouseId", Text)
            .field("status", Text)
            .field("requestedBy", Text)
            .field("approvedBy", Text)
            .field("shippedAt", Timestamp)
            .field("receivedAt", Timestamp)
            .field("notes", Text)
            .belongs_to("fromWarehouse", "warehouse", "fromWarehouseId")
            .belongs_to("toWarehouse", "warehouse", "toWarehouseId")
            .has_many("items", "transferitem", "transferId")
            .belongs_to("requester", "user", "requestedBy")
            .belongs_to("approver", "user", "approvedBy"),
        EntityDef::new("transferitem", "transfer-items", "transfer_items")
            .field("transferId", Text)
            .field("productVariantId", Text)
            .field("requestedQuantity", Integer)
            .field("shippedQuantity", Integer)
            .field("receivedQuantity", Integer)
            .belongs_to("transfer", "transfer", "transferId")
            .belongs_to("productVariant", "productvariant", "productVariantId"),
        EntityDef::new("customer", "customers", "customers")
            .field("name", Text)
            .field("email", Text)
            .field("phone", Text)
            .field("customerType", Text)
            .field("creditLimit", Decimal)
            .field("paymentTerms", Integer)
            .field("taxId", Text)
            .field("isActive", Boolean)
            .has_many("addresses", "customeraddress", "customerId")
            .has_many("orders", "order", "customerId"),
        EntityDef::new("customeraddress", "customer-addresses", "customer_addresses")
            .field("customerId", Text)
            .field("addressType", Text)
            .field("addressLine1", Text)
            .field("addressLine2", Text)
            .field("city", Text)
            .field("state", Text)
            .field("postalCode", Text)
            .field("country", Text)
            .field("isDefault", Boolean)
            .field("isActive", Boolean)
            .belongs_to("customer", "customer", "customerId")
            .has_many("billingOrders", "order", "billingAddressId")
            .has_many("shippingOrders", "order", "shippingAddressId"),
        EntityDef::new("carrier", "carriers", "carriers")
            .field("name", Text)
            .field("code", Text)
            .field("contactInfo", Text)
            .field("apiEndpoint", Text)
            .field("isActive", Boolean)
            .has_many("shipments", "shipment", "carrierId"),
        EntityDef::new("order", "orders", "orders")
            .field("orderNumber", Text)
            .field("customerId", Text)
            .field("warehouseId", Text)
            .field("billingAddressId", Text)
            .field("shippingAddressId", Text)
            .field("status", Text)
            .field("approvalStatus", Text)
            .field("approvedBy", Text)
            .field("approvedAt", Timestamp)
            .field("approvalNotes", Text)
            .field("orderDate", Timestamp)
            .field("requiredDate", Timestamp)
            .field("shippedDate", Timestamp)
            .field("deliveryDate", Timestamp)
            .field("orderType", Text)
            .field("totalAmount", Decimal)
            .field("taxAmount", Decimal)
            .field("discountAmount", Decimal)
            .field("notes", Text)
            .field("createdBy", Text)
            .belongs_to("customer", "customer", "customerId")
            .belongs_to("warehouse", "warehouse", "warehouseId")
            .belongs_to("billingAddress", "customeraddress", "billingAddressId")
            .belongs_to("shippingAddress", "customeraddress", "shippingAddressId")
            .belongs_to("approver", "user", "approvedBy")
            .belongs_to("creator", "user", "createdBy")
            .has_many("items", "orderitem", "orderId")
            .has_many("shipments", "shipment", "orderId"),
        EntityDef::new("orderitem", "order-items", "order_items")
            .field("orderId", Text)
            .field("productVariantId", Text)
            .field("quantity", Integer)
            .field("unitPrice", Decimal)
            .field("totalPrice", Decimal)
            .belongs_to("order", "order", "orderId")
            .belongs_to("productVariant", "productvariant", "productVariantId"),
        EntityDef::new("shipment", "shipments", "shipments")
            .field("shipmentNumber", Text)
            .field("orderId", Text)
            .field("carrierId", Text)
            .field("trackingNumber", Text)
            .field("shippingMethod", Text)
            .field("status", Text)
            .field("shippedDate", Timestamp)
            .field("estimatedDelivery", Timestamp)
            .field("actualDelivery", Timestamp)
            .field("shippingCost", Decimal)
            .field("weight", Decimal)
            .field("dimensions", Text)
            .belongs_to("order", "order", "orderId")
            .belongs_to("carrier", "carrier", "carrierId"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("orderDate"), "order_date");
        assert_eq!(snake_case("id"), "id");
        assert_eq!(snake_case("productVariantId"), "product_variant_id");
        assert_eq!(snake_case("addressLine1"), "address_line1");
    }

    #[test]
    fn test_every_entity_has_base_fields() {
        for entity in erp_entities() {
            for base in ["id", "createdAt", "updatedAt"] {
                assert!(
                    entity.find_field(base).is_some(),
                    "{} is missing {}",
                    entity.name,
                    base
                );
            }
        }
    }

    #[test]
    fn test_relation_keys_are_declared_fields() {
        let entities = erp_entities();
        for entity in &entities {
            for relation in &entity.relations {
                let target = entities
                    .iter()
                    .find(|e| e.name == relation.target)
                    .unwrap_or_else(|| panic!("unknown target {}", relation.target));
                match &relation.link {
                    RelationLink::BelongsTo { local } => {
                        assert!(entity.find_field(local).is_some(), "{}.{}", entity.name, local)
                    }
                    RelationLink::HasMany { foreign } => {
                        assert!(target.find_field(foreign).is_some(), "{}.{}", target.name, foreign)
                    }
                }
            }
        }
    }
}
