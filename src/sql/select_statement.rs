use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    sql::{OptionalColumn, SqlFragment},
    symbols::{Symbol, SymbolId},
};

#[derive(Debug, Clone)]
pub enum SelectItem {
    Column { expr: SqlFragment, alias: Rc<Symbol> },
    Optional(OptionalColumn),
}

impl SelectItem {
    pub fn alias(&self) -> &Rc<Symbol> {
        match self {
            SelectItem::Column { alias, .. } => alias,
            SelectItem::Optional(column) => &column.symbol,
        }
    }
}

/// Row count of a paging clause.
#[derive(Debug, Clone)]
pub enum RowCount {
    Constant(i64),
    Expression(SqlFragment),
}

impl RowCount {
    pub fn to_fragment(&self) -> SqlFragment {
        match self {
            RowCount::Constant(n) => SqlFragment::from_text(n.to_string()),
            RowCount::Expression(f) => f.clone(),
        }
    }

    /// `self - other`, floored at zero for constants.
    pub fn minus(&self, other: &RowCount) -> RowCount {
        match (self, other) {
            (RowCount::Constant(a), RowCount::Constant(b)) => RowCount::Constant((a - b).max(0)),
            _ => {
                let mut f = SqlFragment::from_text("(");
                f.fragment(self.to_fragment()).text(" - ").fragment(other.to_fragment()).text(")");
                RowCount::Expression(f)
            }
        }
    }
}

/// The node asking to reuse a child statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    Filter,
    Project,
    Sort,
    Limit,
    Skip,
    Distinct,
    GroupBy,
    JoinInput,
}

/// One SELECT under construction.
#[derive(Debug, Clone, Default)]
pub struct SelectStatement {
    pub select: Vec<SelectItem>,
    pub from: SqlFragment,
    pub where_clause: SqlFragment,
    pub group_by: SqlFragment,
    /// Aggregated by a GroupBy, even one without keys.
    pub is_grouped: bool,
    pub order_by: SqlFragment,
    pub limit: Option<RowCount>,
    pub skip: Option<RowCount>,
    pub with_ties: bool,
    /// Skip already applied through a ROW_NUMBER() derived table.
    pub row_number_paged: bool,
    pub is_distinct: bool,
    /// Outermost statement of the command; its ORDER BY is always rendered.
    pub is_top_most: bool,
    /// Leaf extents bound by this statement's FROM clause.
    pub from_extents: Vec<Rc<Symbol>>,
    /// Extents referenced here but bound by an enclosing statement.
    pub outer_extents: IndexMap<SymbolId, Rc<Symbol>>,
    /// Shape exposed to a wrapping statement: output name -> column alias,
    /// or a nested record for join members.
    pub output_columns: IndexMap<String, Rc<Symbol>>,
}

impl SelectStatement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_select(&self) -> bool {
        !self.select.is_empty()
    }

    pub fn has_paging(&self) -> bool {
        self.limit.is_some() || self.skip.is_some() || self.row_number_paged
    }

    /// ORDER BY is legal in the outermost statement or next to a row restriction.
    pub fn order_by_allowed(&self) -> bool {
        self.is_top_most || self.limit.is_some() || self.skip.is_some()
    }

    /// Only a FROM clause so far.
    pub fn is_bare(&self) -> bool {
        self.select.is_empty()
            && self.where_clause.is_empty()
            && !self.is_grouped
            && self.order_by.is_empty()
            && !self.has_paging()
            && !self.is_distinct
    }

    /// Whether a node of `kind` may extend this statement instead of wrapping it.
    pub fn can_fold(&self, kind: FoldKind) -> bool {
        match kind {
            FoldKind::Filter => !self.is_grouped && !self.has_paging() && !self.is_distinct,
            FoldKind::Project => !self.has_select() && !self.is_distinct,
            FoldKind::Sort => self.order_by.is_empty() && !self.has_paging(),
            FoldKind::Limit => self.limit.is_none(),
            FoldKind::Skip => self.skip.is_none() && !self.row_number_paged,
            FoldKind::Distinct => !self.is_distinct && !self.has_paging() && self.order_by.is_empty(),
            FoldKind::GroupBy => {
                !self.has_select() && !self.is_grouped && !self.has_paging() && !self.is_distinct
            }
            FoldKind::JoinInput => self.is_bare(),
        }
    }

    pub fn add_where(&mut self, predicate: SqlFragment) {
        if self.where_clause.is_empty() {
            self.where_clause = predicate;
            return;
        }
        let existing = std::mem::take(&mut self.where_clause);
        self.where_clause
            .fragment(SqlFragment::parenthesized(existing))
            .text(" AND ")
            .fragment(SqlFragment::parenthesized(predicate));
    }

    pub fn add_from_extent(&mut self, symbol: &Rc<Symbol>) {
        for leaf in symbol.leaves() {
            if !self.from_extents.iter().any(|e| e.id == leaf.id) {
                self.from_extents.push(leaf);
            }
        }
    }

    /// Whether every extent behind `symbol` is bound by this statement's FROM clause.
    pub fn is_local(&self, symbol: &Rc<Symbol>) -> bool {
        symbol.leaves().iter().all(|leaf| self.from_extents.iter().any(|e| e.id == leaf.id))
    }

    /// Record the non-local extents behind `symbol` as outer references.
    pub fn add_outer_extent(&mut self, symbol: &Rc<Symbol>) {
        for leaf in symbol.leaves() {
            if !self.from_extents.iter().any(|e| e.id == leaf.id) {
                self.outer_extents.entry(leaf.id).or_insert(leaf);
            }
        }
    }

    /// Inherit the outer references of a nested statement that are not bound here.
    pub fn merge_outer_extents(&mut self, nested: &SelectStatement) {
        for symbol in nested.outer_extents.values() {
            self.add_outer_extent(symbol);
        }
    }

    pub fn set_output_columns(&mut self) {
        self.output_columns = self.select.iter()
            .map(|item| (item.alias().name.clone(), Rc::clone(item.alias())))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ResultType;

    fn extent(id: SymbolId, name: &str) -> Rc<Symbol> {
        Rc::new(Symbol::extent(id, name, ResultType::empty_row(), false))
    }

    #[test]
    fn test_filter_does_not_fold_over_paging() {
        let mut s = SelectStatement::new();
        assert!(s.can_fold(FoldKind::Filter));
        s.limit = Some(RowCount::Constant(10));
        assert!(!s.can_fold(FoldKind::Filter));
        assert!(s.can_fold(FoldKind::Skip));
        assert!(!s.can_fold(FoldKind::Limit));
    }

    #[test]
    fn test_project_does_not_fold_twice() {
        let mut s = SelectStatement::new();
        s.select.push(SelectItem::Column {
            expr: SqlFragment::from_text("1"),
            alias: Rc::new(Symbol::column(1, "c", ResultType::empty_row(), false)),
        });
        assert!(!s.can_fold(FoldKind::Project));
        assert!(s.can_fold(FoldKind::Filter));
    }

    #[test]
    fn test_keyless_grouping_blocks_filter() {
        let s = SelectStatement { is_grouped: true, ..SelectStatement::new() };
        assert!(s.group_by.is_empty());
        assert!(!s.can_fold(FoldKind::Filter));
        assert!(!s.can_fold(FoldKind::GroupBy));
        assert!(!s.is_bare());
    }

    #[test]
    fn test_distinct_does_not_fold_over_ordering() {
        let s = SelectStatement { order_by: SqlFragment::from_text("x"), ..SelectStatement::new() };
        assert!(!s.can_fold(FoldKind::Distinct));
    }

    #[test]
    fn test_order_by_allowed_only_when_outermost_or_paged() {
        let mut s = SelectStatement::new();
        assert!(!s.order_by_allowed());
        s.skip = Some(RowCount::Constant(1));
        assert!(s.order_by_allowed());
        let t = SelectStatement { is_top_most: true, ..SelectStatement::new() };
        assert!(t.order_by_allowed());
    }

    #[test]
    fn test_outer_extents_exclude_local_ones() {
        let a = extent(1, "A");
        let b = extent(2, "B");
        let mut s = SelectStatement::new();
        s.add_from_extent(&a);
        s.add_outer_extent(&a);
        s.add_outer_extent(&b);
        assert!(s.is_local(&a));
        assert!(!s.is_local(&b));
        assert_eq!(s.outer_extents.len(), 1);
        assert!(s.outer_extents.contains_key(&2));
    }

    #[test]
    fn test_row_count_minus() {
        assert!(matches!(RowCount::Constant(10).minus(&RowCount::Constant(5)), RowCount::Constant(5)));
        assert!(matches!(RowCount::Constant(3).minus(&RowCount::Constant(5)), RowCount::Constant(0)));
        let expr = RowCount::Expression(SqlFragment::from_text("@n")).minus(&RowCount::Constant(1));
        assert!(matches!(expr, RowCount::Expression(_)));
    }

    #[test]
    fn test_add_where_combines_with_and() {
        let mut s = SelectStatement::new();
        s.add_where(SqlFragment::from_text("a = 1"));
        s.add_where(SqlFragment::from_text("b = 2"));
        assert_eq!(s.where_clause.parts().len(), 3);
    }
}
