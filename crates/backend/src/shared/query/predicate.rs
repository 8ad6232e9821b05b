use contracts::shared::query::FilterValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One conjunctive term of a list predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// `field <cmp> value`
    Compare {
        field: String,
        cmp: Comparison,
        value: FilterValue,
    },
    /// `field LIKE %pattern%`
    Contains { field: String, pattern: String },
    /// `field = v1 OR field = v2 ...`
    AnyOf {
        field: String,
        values: Vec<FilterValue>,
    },
    /// Substring match on any of `fields`
    Search { fields: Vec<String>, pattern: String },
}

impl Term {
    pub fn compare(field: &str, cmp: Comparison, value: FilterValue) -> Self {
        Term::Compare {
            field: field.to_string(),
            cmp,
            value,
        }
    }

    /// Field the term constrains; `None` for multi-field search
    pub fn field(&self) -> Option<&str> {
        match self {
            Term::Compare { field, .. } | Term::Contains { field, .. } | Term::AnyOf { field, .. } => {
                Some(field)
            }
            Term::Search { .. } => None,
        }
    }
}

/// Conjunction (AND) of terms; empty means "no filter"
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn terms_on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.terms.iter().filter(move |t| t.field() == Some(field))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}
