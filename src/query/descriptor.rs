use crate::{
    database::ValueType,
    error::QueryError,
    expr::{Expr, Node, OrderSpecifier, Predicate},
    query::{EntityPath, RelationPath},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectTarget {
    Entity(EntityPath),
    Expr(Expr),
}

/// One entry of the select list, optionally named.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub target: SelectTarget,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn expr(expr: Expr) -> Self {
        Self { target: SelectTarget::Expr(expr), alias: None }
    }

    pub fn entity(path: &EntityPath) -> Self {
        Self { target: SelectTarget::Entity(path.clone()), alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Name used for field binding: the alias, else the bare column name.
    pub fn binding_name(&self) -> Option<&str> {
        match (&self.alias, &self.target) {
            (Some(alias), _) => Some(alias),
            (None, SelectTarget::Expr(Expr::Column(c))) => Some(&c.name),
            _ => None,
        }
    }

    pub fn value_type(&self) -> Option<ValueType> {
        match &self.target {
            SelectTarget::Expr(e) => Some(e.value_type()),
            SelectTarget::Entity(_) => None,
        }
    }
}

impl From<&EntityPath> for SelectItem {
    fn from(path: &EntityPath) -> Self {
        SelectItem::entity(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeBinding {
    /// Match select items to fields by name.
    Fields,
    /// Match select items to fields by position.
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// The first source entity.
    Default,
    Single(SelectItem),
    Tuple(Vec<SelectItem>),
    /// `targets[i]` names the shape field fed by select item `i`, if any.
    Shape { name: &'static str, binding: ShapeBinding, items: Vec<SelectItem>, targets: Vec<Option<&'static str>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Cross,
}

/// The declared relation a join follows: `owner` is the alias it starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRelation {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub target: EntityPath,
    pub relation: Option<JoinRelation>,
    /// Relation joins start with the implied equality.
    pub on: Vec<Predicate>,
    pub fetch: bool,
}

/// Builder misuse recorded while chaining and reported by `validate`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DeferredError {
    Misplaced(&'static str),
    InvalidJoin(String),
}

impl From<DeferredError> for QueryError {
    fn from(e: DeferredError) -> Self {
        match e {
            DeferredError::Misplaced(clause) => QueryError::MisplacedClause(clause),
            DeferredError::InvalidJoin(msg) => QueryError::InvalidJoin(msg),
        }
    }
}

/// Everything a query says, independent of how it is rendered or executed.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub projection: Projection,
    pub from: Vec<EntityPath>,
    pub joins: Vec<JoinClause>,
    /// ANDed.
    pub filter: Vec<Predicate>,
    pub group_by: Vec<Expr>,
    /// ANDed.
    pub having: Vec<Predicate>,
    pub order_by: Vec<OrderSpecifier>,
    pub distinct: bool,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub(crate) deferred: Option<DeferredError>,
}

impl QueryDescriptor {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            from: Vec::new(),
            joins: Vec::new(),
            filter: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            distinct: false,
            offset: None,
            limit: None,
            deferred: None,
        }
    }

    fn defer(&mut self, error: DeferredError) {
        if self.deferred.is_none() {
            self.deferred = Some(error);
        }
    }

    pub(crate) fn add_from(&mut self, path: &EntityPath) {
        self.from.push(path.clone());
    }

    pub(crate) fn add_relation_join(&mut self, kind: JoinKind, relation: RelationPath, target: &EntityPath) {
        match relation.join_predicate(target) {
            Ok(implied) => self.joins.push(JoinClause {
                kind,
                target: target.clone(),
                relation: Some(JoinRelation {
                    owner: relation.owner.alias().to_string(),
                    name: relation.relation.name.clone(),
                }),
                on: vec![implied],
                fetch: false,
            }),
            Err(e) => self.defer(DeferredError::InvalidJoin(e.to_string())),
        }
    }

    pub(crate) fn add_unrelated_join(&mut self, kind: JoinKind, target: &EntityPath) {
        self.joins.push(JoinClause { kind, target: target.clone(), relation: None, on: Vec::new(), fetch: false });
    }

    pub(crate) fn add_on(&mut self, predicate: Predicate) {
        match self.joins.last_mut() {
            Some(join) => {
                if join.kind == JoinKind::Cross {
                    join.kind = JoinKind::Inner;
                }
                join.on.push(predicate);
            }
            None => self.defer(DeferredError::Misplaced("on")),
        }
    }

    pub(crate) fn mark_fetch(&mut self) {
        match self.joins.last_mut() {
            Some(join) if join.relation.is_some() => join.fetch = true,
            Some(join) => {
                let msg = format!("fetch join on `{}` requires a declared relation", join.target.alias());
                self.defer(DeferredError::InvalidJoin(msg));
            }
            None => self.defer(DeferredError::Misplaced("fetch_join")),
        }
    }

    /// Select list with the default projection resolved.
    pub fn select_items(&self) -> Vec<SelectItem> {
        match &self.projection {
            Projection::Default => self.from.first().map(SelectItem::entity).into_iter().collect(),
            Projection::Single(item) => vec![item.clone()],
            Projection::Tuple(items) | Projection::Shape { items, .. } => items.clone(),
        }
    }

    /// Static type of the single column a scalar subquery yields.
    pub fn scalar_type(&self) -> ValueType {
        match self.select_items().as_slice() {
            [item] => item.value_type().unwrap_or(ValueType::Null),
            _ => ValueType::Null,
        }
    }

    /// Whether rows are collapsed into groups.
    pub fn is_aggregate(&self) -> bool {
        !self.group_by.is_empty()
            || !self.having.is_empty()
            || self.select_items().iter().any(|i| matches!(&i.target, SelectTarget::Expr(e) if e.contains_aggregate()))
    }

    /// Every source: from-list entries, then join targets in order.
    pub fn sources(&self) -> impl Iterator<Item = &EntityPath> {
        self.from.iter().chain(self.joins.iter().map(|j| &j.target))
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        self.validate_scoped(&[])
    }

    fn validate_scoped(&self, outer: &[String]) -> Result<(), QueryError> {
        if let Some(e) = &self.deferred {
            return Err(e.clone().into());
        }
        if self.from.is_empty() {
            return Err(QueryError::MissingSource);
        }

        let mut scope: Vec<String> = outer.to_vec();
        let mut local: Vec<&str> = Vec::new();
        for source in self.sources() {
            if scope.iter().any(|a| a == source.alias()) {
                return Err(QueryError::AmbiguousAlias(source.alias().to_string()));
            }
            scope.push(source.alias().to_string());
            local.push(source.alias());
        }

        for (i, join) in self.joins.iter().enumerate() {
            if join.fetch && join.relation.is_none() {
                return Err(QueryError::InvalidJoin(format!("fetch join on `{}` requires a declared relation", join.target.alias())));
            }
            if let Some(rel) = &join.relation {
                // the owner must be bound before the join itself
                let visible = self.from.len() + i;
                if !local[..visible].contains(&rel.owner.as_str()) {
                    return Err(QueryError::UnboundAlias(rel.owner.clone()));
                }
            }
        }

        let items = self.select_items();
        let mut nodes = Vec::new();
        let mut collect = |n: Node<'_>| nodes.push(match n {
            Node::Column(c) => Ok(c.alias.clone()),
            Node::SubQuery(q) => Err(q.clone()),
        });
        for item in &items {
            match &item.target {
                SelectTarget::Expr(e) => e.visit(&mut collect),
                SelectTarget::Entity(path) => collect(Node::Column(&path.id_column())),
            }
        }
        self.joins.iter().flat_map(|j| &j.on).for_each(|p| p.visit(&mut collect));
        self.filter.iter().for_each(|p| p.visit(&mut collect));
        self.group_by.iter().for_each(|e| e.visit(&mut collect));
        self.having.iter().for_each(|p| p.visit(&mut collect));
        self.order_by.iter().for_each(|o| o.expr.visit(&mut collect));

        for node in nodes {
            match node {
                Ok(alias) if !scope.contains(&alias) => return Err(QueryError::UnboundAlias(alias)),
                Ok(_) => {}
                Err(sub) => sub.validate_scoped(&scope)?,
            }
        }
        Ok(())
    }
}
