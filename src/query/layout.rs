use crate::{
    expr::Expr,
    query::{EntityPath, QueryDescriptor, SelectTarget},
};

/// A column of the rendered select list.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutColumn {
    pub expr: Expr,
    pub alias: Option<String>,
}

/// An entity's columns within a row, starting at `start`, plus the entities
/// materialised with it through fetch joins.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySlot {
    pub path: EntityPath,
    pub start: usize,
    /// Relation name and the slot of the fetched entity.
    pub fetched: Vec<(String, EntitySlot)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(usize),
    Entity(EntitySlot),
}

/// Select list flattened into plain columns, with one slot per select item
/// telling the mapper where its data lives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectLayout {
    pub columns: Vec<LayoutColumn>,
    pub slots: Vec<Slot>,
}

impl SelectLayout {
    pub fn of(descriptor: &QueryDescriptor) -> Self {
        let mut layout = SelectLayout::default();
        for item in descriptor.select_items() {
            let slot = match item.target {
                SelectTarget::Expr(expr) => {
                    layout.columns.push(LayoutColumn { expr, alias: item.alias });
                    Slot::Value(layout.columns.len() - 1)
                }
                SelectTarget::Entity(path) => Slot::Entity(layout.push_entity(descriptor, &path)),
            };
            layout.slots.push(slot);
        }
        layout
    }

    fn push_entity(&mut self, descriptor: &QueryDescriptor, path: &EntityPath) -> EntitySlot {
        let start = self.columns.len();
        self.columns.extend(path.columns().into_iter().map(|c| LayoutColumn { expr: Expr::Column(c), alias: None }));

        let mut fetched = Vec::new();
        for join in descriptor.joins.iter().filter(|j| j.fetch) {
            if let Some(rel) = join.relation.as_ref().filter(|r| r.owner == path.alias()) {
                let slot = self.push_entity(descriptor, &join.target);
                fetched.push((rel.name.clone(), slot));
            }
        }
        EntitySlot { path: path.clone(), start, fetched }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}
