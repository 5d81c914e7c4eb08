use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::punctuated::Punctuated;
use syn::{Attribute, BinOp, ExprBinary, ImplItem, Item, Meta, Token, TraitItem};

use crate::catalog::{Catalog, CategorySet, Operator};
use crate::mutant::MutationSite;
use crate::source::SourceUnit;
use crate::span::SourceSpan;

/// Collect every eligible binary operator in `unit`, in pre-order.
///
/// Items marked `#[test]` or `#[cfg(test)]` are skipped, and operators inside
/// macro invocations are never seen because macro bodies are opaque tokens.
pub fn find_sites(unit: &SourceUnit, catalog: &Catalog, categories: &CategorySet) -> Vec<MutationSite> {
    let mut finder = SiteFinder {
        unit,
        catalog,
        categories,
        sites: Vec::new(),
    };
    finder.visit_file(unit.syntax());
    finder.sites
}

struct SiteFinder<'a> {
    unit: &'a SourceUnit,
    catalog: &'a Catalog,
    categories: &'a CategorySet,
    sites: Vec<MutationSite>,
}

impl SiteFinder<'_> {
    fn record(&mut self, node: &ExprBinary) {
        let Some(op) = operator_of(&node.op) else {
            return;
        };
        let Some(entry) = self.catalog.lookup(op) else {
            return;
        };
        if !self.categories.contains(entry.category) {
            return;
        }

        let Some(start) = self.unit.offset_of(node.op.span().start()) else {
            return;
        };
        let end = start + op.symbol().len();

        // Skip anything the span arithmetic cannot pin to the operator text.
        if self.unit.text().get(start..end) != Some(op.symbol()) {
            return;
        }
        let Some(position) = self.unit.position_of(start) else {
            return;
        };

        self.sites.push(MutationSite {
            entry: *entry,
            span: SourceSpan {
                file: self.unit.relative_path().to_path_buf(),
                start: start as u32,
                end: end as u32,
            },
            position,
        });
    }
}

impl<'ast> Visit<'ast> for SiteFinder<'_> {
    fn visit_expr_binary(&mut self, node: &'ast ExprBinary) {
        self.record(node);
        visit::visit_expr_binary(self, node);
    }

    fn visit_item(&mut self, node: &'ast Item) {
        if !is_test_code(item_attrs(node)) {
            visit::visit_item(self, node);
        }
    }

    fn visit_impl_item(&mut self, node: &'ast ImplItem) {
        if !is_test_code(impl_item_attrs(node)) {
            visit::visit_impl_item(self, node);
        }
    }

    fn visit_trait_item(&mut self, node: &'ast TraitItem) {
        if !is_test_code(trait_item_attrs(node)) {
            visit::visit_trait_item(self, node);
        }
    }
}

fn item_attrs(item: &Item) -> &[Attribute] {
    match item {
        Item::Const(i) => &i.attrs,
        Item::Enum(i) => &i.attrs,
        Item::ExternCrate(i) => &i.attrs,
        Item::Fn(i) => &i.attrs,
        Item::ForeignMod(i) => &i.attrs,
        Item::Impl(i) => &i.attrs,
        Item::Macro(i) => &i.attrs,
        Item::Mod(i) => &i.attrs,
        Item::Static(i) => &i.attrs,
        Item::Struct(i) => &i.attrs,
        Item::Trait(i) => &i.attrs,
        Item::TraitAlias(i) => &i.attrs,
        Item::Type(i) => &i.attrs,
        Item::Union(i) => &i.attrs,
        Item::Use(i) => &i.attrs,
        _ => &[],
    }
}

fn impl_item_attrs(item: &ImplItem) -> &[Attribute] {
    match item {
        ImplItem::Const(i) => &i.attrs,
        ImplItem::Fn(i) => &i.attrs,
        ImplItem::Type(i) => &i.attrs,
        ImplItem::Macro(i) => &i.attrs,
        _ => &[],
    }
}

fn trait_item_attrs(item: &TraitItem) -> &[Attribute] {
    match item {
        TraitItem::Const(i) => &i.attrs,
        TraitItem::Fn(i) => &i.attrs,
        TraitItem::Type(i) => &i.attrs,
        TraitItem::Macro(i) => &i.attrs,
        _ => &[],
    }
}

/// Map a `syn` operator onto the catalog's operator set.
///
/// Compound assignments (`+=`, `<<=`, ...) have no counterpart and are never sites.
fn operator_of(op: &BinOp) -> Option<Operator> {
    let op = match op {
        BinOp::Eq(_) => Operator::Eq,
        BinOp::Ne(_) => Operator::Ne,
        BinOp::Lt(_) => Operator::Lt,
        BinOp::Le(_) => Operator::Le,
        BinOp::Gt(_) => Operator::Gt,
        BinOp::Ge(_) => Operator::Ge,
        BinOp::And(_) => Operator::And,
        BinOp::Or(_) => Operator::Or,
        BinOp::Add(_) => Operator::Add,
        BinOp::Sub(_) => Operator::Sub,
        BinOp::Mul(_) => Operator::Mul,
        BinOp::Div(_) => Operator::Div,
        BinOp::Rem(_) => Operator::Rem,
        BinOp::BitAnd(_) => Operator::BitAnd,
        BinOp::BitOr(_) => Operator::BitOr,
        BinOp::BitXor(_) => Operator::BitXor,
        BinOp::Shl(_) => Operator::Shl,
        BinOp::Shr(_) => Operator::Shr,
        _ => return None,
    };
    Some(op)
}

/// `#[test]`, `#[tokio::test]` and friends, or `#[cfg(test)]`.
fn is_test_code(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        let is_test_attr = attr
            .path()
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "test");

        let is_cfg_test = match &attr.meta {
            Meta::List(list) if list.path.is_ident("cfg") => list
                .parse_args::<Meta>()
                .is_ok_and(|predicate| requires_test(&predicate)),
            _ => false,
        };

        is_test_attr || is_cfg_test
    })
}

/// True when a `cfg` predicate can only hold under `--test`.
///
/// `all(..)` needs one such operand, `any(..)` needs all of them. `not(..)`
/// and anything unrecognised count as live code.
fn requires_test(predicate: &Meta) -> bool {
    match predicate {
        Meta::Path(path) => path.is_ident("test"),
        Meta::List(list) => {
            let Ok(operands) =
                list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
            else {
                return false;
            };

            if list.path.is_ident("all") {
                operands.iter().any(requires_test)
            } else if list.path.is_ident("any") {
                !operands.is_empty() && operands.iter().all(requires_test)
            } else {
                false
            }
        }
        Meta::NameValue(_) => false,
    }
}
