//! Query-string parsing for the generic list and detail routes.
//! Never fails: malformed values fall back to defaults.

use std::collections::{BTreeMap, HashMap};

use contracts::shared::query::FilterValue;

use crate::shared::config::QueryConfig;

const FILTER_PREFIX: &str = "filter_";
const RESERVED: &[&str] = &[
    "page",
    "limit",
    "sort",
    "sortBy",
    "order",
    "sortOrder",
    "populate",
    "depth",
    "search",
];

/// Parsed parameters of `GET /api/:model`
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub populate: Vec<String>,
    pub depth: i64,
    /// Filter keys with the `filter_` prefix stripped; includes `search`
    pub filters: BTreeMap<String, FilterValue>,
}

impl ListParams {
    pub fn from_query(query: &HashMap<String, String>, cfg: &QueryConfig, default_depth: i64) -> Self {
        let get = |key: &str| query.get(key).map(String::as_str);

        let page = get("page")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = get("limit")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(cfg.default_limit)
            .min(cfg.max_limit.max(1));

        let mut filters = BTreeMap::new();
        for (key, value) in query {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            let key = key.strip_prefix(FILTER_PREFIX).unwrap_or(key);
            if key.is_empty() {
                continue;
            }
            filters.insert(key.to_string(), FilterValue::text(value.clone()));
        }
        if let Some(search) = get("search").filter(|s| !s.trim().is_empty()) {
            filters.insert("search".to_string(), FilterValue::text(search));
        }

        Self {
            page,
            limit,
            sort: get("sort").or_else(|| get("sortBy")).map(str::to_string),
            order: get("order").or_else(|| get("sortOrder")).map(str::to_string),
            populate: parse_populate(get("populate")),
            depth: parse_depth(get("depth"), default_depth),
            filters,
        }
    }

    /// Row offset of the page, saturated to what SQLite accepts
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

/// Parsed parameters of `GET /api/:model/:id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailParams {
    pub populate: Vec<String>,
    pub depth: i64,
}

impl DetailParams {
    pub fn from_query(query: &HashMap<String, String>, default_depth: i64) -> Self {
        Self {
            populate: parse_populate(query.get("populate").map(String::as_str)),
            depth: parse_depth(query.get("depth").map(String::as_str), default_depth),
        }
    }
}

/// `"customer, items,,"` -> `["customer", "items"]`
pub fn parse_populate(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub fn parse_depth(raw: Option<&str>, default_depth: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    fn query(pairs: HashMap<&str, &str>) -> HashMap<String, String> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let p = ListParams::from_query(&HashMap::new(), &QueryConfig::default(), 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.depth, 1);
        assert!(p.populate.is_empty());
        assert!(p.filters.is_empty());
        assert!(p.sort.is_none());
    }

    #[test]
    fn test_full_query() {
        let q = query(hashmap! {
            "page" => "3",
            "limit" => "500",
            "sortBy" => "orderDate",
            "sortOrder" => "asc",
            "populate" => " customer ,items,",
            "depth" => "2",
            "search" => "acme",
            "filter_status" => "PENDING",
            "filter_orderDate_op" => "gte",
            "orderDate" => "2024-01-01",
        });
        let p = ListParams::from_query(&q, &QueryConfig::default(), 1);
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset(), 200);
        assert_eq!(p.sort.as_deref(), Some("orderDate"));
        assert_eq!(p.order.as_deref(), Some("asc"));
        assert_eq!(p.populate, vec!["customer", "items"]);
        assert_eq!(p.depth, 2);
        assert_eq!(p.filters.get("status"), Some(&FilterValue::text("PENDING")));
        assert_eq!(p.filters.get("orderDate_op"), Some(&FilterValue::text("gte")));
        assert_eq!(p.filters.get("orderDate"), Some(&FilterValue::text("2024-01-01")));
        assert_eq!(p.filters.get("search"), Some(&FilterValue::text("acme")));
        assert!(!p.filters.contains_key("page"));
    }

    #[test]
    fn test_malformed_numbers_fall_back() {
        let q = query(hashmap! { "page" => "0", "limit" => "lots", "depth" => "deep" });
        let p = ListParams::from_query(&q, &QueryConfig::default(), 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
        assert_eq!(p.depth, 1);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let q = query(hashmap! { "page" => "18446744073709551615", "limit" => "50" });
        let p = ListParams::from_query(&q, &QueryConfig::default(), 1);
        assert_eq!(p.page, u64::MAX);
        assert_eq!(p.offset(), i64::MAX as u64);

        let q = query(hashmap! { "page" => "1000000000000000000" });
        let p = ListParams::from_query(&q, &QueryConfig::default(), 1);
        assert_eq!(p.offset(), i64::MAX as u64);
    }

    #[test]
    fn test_detail_params() {
        let q = query(hashmap! { "populate" => "customer", "depth" => "-1" });
        let p = DetailParams::from_query(&q, 1);
        assert_eq!(p.populate, vec!["customer"]);
        // resolver maps non-positive depth to the default
        assert_eq!(p.depth, -1);
    }
}
