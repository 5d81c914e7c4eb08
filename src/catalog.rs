use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic group of operators that are enabled or disabled together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// `==`, `!=`, `<`, `<=`, `>`, `>=`.
    Comparison,

    /// `&&`, `||`.
    Logical,

    /// `+`, `-`, `*`, `/`.
    Arithmetic,

    /// `&`, `|`, `^`, `<<`, `>>`.
    Bitwise,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Comparison,
        Category::Logical,
        Category::Arithmetic,
        Category::Bitwise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Comparison => "comparison",
            Category::Logical => "logical",
            Category::Arithmetic => "arithmetic",
            Category::Bitwise => "bitwise",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name() == s.trim())
            .ok_or(())
    }
}

/// Binary operators the engine knows how to locate in source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl Operator {
    /// Source text of the operator token.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::Shl => "<<",
            Operator::Shr => ">>",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One row of the substitution table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperatorEntry {
    pub original: Operator,
    pub replacement: Operator,
    pub category: Category,
}

/// Immutable operator substitution table.
///
/// The mapping is not an involution (`^` becomes `&`, but `&` becomes `|`),
/// so a mutation is only ever undone by restoring the recorded original.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<Operator, OperatorEntry>,
}

impl Catalog {
    /// Build a catalog from explicit rows. Later rows win on duplicates.
    pub fn from_entries(rows: impl IntoIterator<Item = OperatorEntry>) -> Self {
        let entries = rows.into_iter().map(|e| (e.original, e)).collect();
        Self { entries }
    }

    /// The default table used by the CLI.
    pub fn standard() -> Self {
        use Category::{Arithmetic, Bitwise, Comparison, Logical};
        use Operator as Op;

        let rows = [
            // comparison
            (Op::Eq, Op::Ne, Comparison),
            (Op::Ne, Op::Eq, Comparison),
            (Op::Lt, Op::Ge, Comparison),
            (Op::Ge, Op::Lt, Comparison),
            (Op::Gt, Op::Le, Comparison),
            (Op::Le, Op::Gt, Comparison),
            // logical
            (Op::And, Op::Or, Logical),
            (Op::Or, Op::And, Logical),
            // arithmetic
            (Op::Add, Op::Sub, Arithmetic),
            (Op::Sub, Op::Add, Arithmetic),
            (Op::Mul, Op::Div, Arithmetic),
            (Op::Div, Op::Mul, Arithmetic),
            // bitwise
            (Op::BitAnd, Op::BitOr, Bitwise),
            (Op::BitOr, Op::BitAnd, Bitwise),
            (Op::BitXor, Op::BitAnd, Bitwise),
            (Op::Shl, Op::Shr, Bitwise),
            (Op::Shr, Op::Shl, Bitwise),
        ];

        Self::from_entries(
            rows.into_iter()
                .map(|(original, replacement, category)| OperatorEntry {
                    original,
                    replacement,
                    category,
                }),
        )
    }

    /// `None` means the operator is not eligible for mutation.
    pub fn lookup(&self, op: Operator) -> Option<&OperatorEntry> {
        self.entries.get(&op)
    }
}

/// Set of enabled categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySet(BTreeSet<Category>);

impl CategorySet {
    pub fn all() -> Self {
        Self(Category::ALL.into_iter().collect())
    }

    /// Parse a comma-separated list. Unknown names are ignored.
    pub fn parse(list: &str) -> Self {
        Self::from_names(list.split(','))
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self(names.into_iter().filter_map(|n| n.trim().parse().ok()).collect())
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Category::name).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_expected_rows() {
        let catalog = Catalog::standard();

        let eq = catalog.lookup(Operator::Eq).expect("== is eligible");
        assert_eq!(eq.replacement, Operator::Ne);
        assert_eq!(eq.category, Category::Comparison);

        let lt = catalog.lookup(Operator::Lt).unwrap();
        assert_eq!(lt.replacement, Operator::Ge);

        let or = catalog.lookup(Operator::Or).unwrap();
        assert_eq!(or.replacement, Operator::And);
        assert_eq!(or.category, Category::Logical);

        let shl = catalog.lookup(Operator::Shl).unwrap();
        assert_eq!(shl.replacement, Operator::Shr);
        assert_eq!(shl.category, Category::Bitwise);

        assert_eq!(catalog.entries.len(), 17);
    }

    #[test]
    fn remainder_is_not_eligible() {
        assert!(Catalog::standard().lookup(Operator::Rem).is_none());
    }

    #[test]
    fn mapping_is_not_an_involution() {
        let catalog = Catalog::standard();

        let xor = catalog.lookup(Operator::BitXor).unwrap();
        assert_eq!(xor.replacement, Operator::BitAnd);

        let again = catalog.lookup(xor.replacement).unwrap();
        assert_eq!(again.replacement, Operator::BitOr);
        assert_ne!(again.replacement, Operator::BitXor);
    }

    #[test]
    fn category_set_ignores_unknown_names() {
        let set = CategorySet::parse("comparison, bogus , bitwise");
        assert!(set.contains(Category::Comparison));
        assert!(set.contains(Category::Bitwise));
        assert!(!set.contains(Category::Logical));
        assert_eq!(set.to_string(), "comparison,bitwise");

        assert!(CategorySet::parse("nope").is_empty());
        assert!(CategorySet::parse("").is_empty());
    }

    #[test]
    fn default_category_set_enables_everything() {
        let set = CategorySet::default();
        for c in Category::ALL {
            assert!(set.contains(c), "{c} should be enabled");
        }
        assert_eq!(set.to_string(), "comparison,logical,arithmetic,bitwise");
    }
}
