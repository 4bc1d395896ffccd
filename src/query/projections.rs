use std::marker::PhantomData;

use serde_json::Value;
use tracing::warn;

use crate::{
    database::ValueType,
    error::QueryError,
    expr::SqlType,
    query::{SelectItem, SelectTarget, ShapeBinding},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeField {
    pub name: &'static str,
    pub ty: ValueType,
}

impl ShapeField {
    pub const fn new(name: &'static str, ty: ValueType) -> Self {
        Self { name, ty }
    }
}

/// A user-declared result shape with a static field table. Unassigned
/// fields keep their `Default` value.
///
/// ```ignore
/// #[derive(Default)]
/// struct MemberDto { username: String, age: i64 }
///
/// impl Shape for MemberDto {
///     const NAME: &'static str = "MemberDto";
///     const FIELDS: &'static [ShapeField] = &[
///         ShapeField::new("username", ValueType::String),
///         ShapeField::new("age", ValueType::Int),
///     ];
///     fn assign(&mut self, field: &str, value: &Value) -> Result<(), QueryError> {
///         match field {
///             "username" => assign(&mut self.username, value),
///             "age" => assign(&mut self.age, value),
///             _ => Ok(()),
///         }
///     }
/// }
/// ```
pub trait Shape: Default + 'static {
    const NAME: &'static str;
    const FIELDS: &'static [ShapeField];

    fn assign(&mut self, field: &str, value: &Value) -> Result<(), QueryError>;
}

/// Store a non-null `value` into `slot`; null leaves the slot untouched.
pub fn assign<T: SqlType>(slot: &mut T, value: &Value) -> Result<(), QueryError> {
    if !value.is_null() {
        *slot = T::from_value(value)?;
    }
    Ok(())
}

/// Store `value` into an optional slot; null clears it.
pub fn assign_opt<T: SqlType>(slot: &mut Option<T>, value: &Value) -> Result<(), QueryError> {
    *slot = if value.is_null() { None } else { Some(T::from_value(value)?) };
    Ok(())
}

/// Select list bound to a shape, with the select position to field table
/// computed up front.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeProjection<S> {
    pub(crate) binding: ShapeBinding,
    pub(crate) items: Vec<SelectItem>,
    pub(crate) targets: Vec<Option<&'static str>>,
    _s: PhantomData<fn() -> S>,
}

impl<S: Shape> ShapeProjection<S> {
    pub fn binding(&self) -> ShapeBinding {
        self.binding
    }

    /// Shape field fed by each select item.
    pub fn targets(&self) -> impl Iterator<Item = Option<&'static str>> + '_ {
        self.targets.iter().copied()
    }
}

pub struct Projections;

impl Projections {
    /// Bind select items to fields of the same name (alias, else column name).
    ///
    /// Items whose name matches no field are dropped and the field keeps its
    /// default value; this is logged but not an error.
    pub fn fields<S: Shape>(items: impl IntoIterator<Item = SelectItem>) -> ShapeProjection<S> {
        let items: Vec<SelectItem> = items.into_iter().collect();
        let targets = items.iter()
            .map(|item| {
                let target = match &item.target {
                    SelectTarget::Expr(_) => item.binding_name()
                        .and_then(|name| S::FIELDS.iter().find(|f| f.name == name))
                        .map(|f| f.name),
                    SelectTarget::Entity(_) => None,
                };
                if target.is_none() {
                    warn!(
                        shape = S::NAME,
                        item = item.binding_name().unwrap_or("<unnamed>"),
                        "select item matches no field, field keeps its default"
                    );
                }
                target
            })
            .collect();
        ShapeProjection { binding: ShapeBinding::Fields, items, targets, _s: PhantomData }
    }

    /// Bind select items to fields by position. Arity and types must line up.
    pub fn constructor<S: Shape>(items: impl IntoIterator<Item = SelectItem>) -> Result<ShapeProjection<S>, QueryError> {
        let items: Vec<SelectItem> = items.into_iter().collect();
        if items.len() != S::FIELDS.len() {
            return Err(QueryError::UnresolvedProjectionField {
                shape: S::NAME,
                detail: format!("{} select items for {} constructor arguments", items.len(), S::FIELDS.len()),
            });
        }
        for (item, field) in items.iter().zip(S::FIELDS) {
            let Some(found) = item.value_type() else {
                return Err(QueryError::UnresolvedProjectionField {
                    shape: S::NAME,
                    detail: format!("argument `{}` cannot take an entity", field.name),
                });
            };
            if !ValueType::is_assignable(field.ty, found) {
                return Err(QueryError::type_mismatch(format!("{}.{}", S::NAME, field.name), field.ty, found));
            }
        }
        let targets = S::FIELDS.iter().map(|f| Some(f.name)).collect();
        Ok(ShapeProjection { binding: ShapeBinding::Constructor, items, targets, _s: PhantomData })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        database::{EntitySchema, Schema},
        expr::Expression,
        query::EntityPath,
    };

    #[derive(Debug, Default, PartialEq)]
    pub struct MemberDto {
        pub username: String,
        pub age: i64,
    }

    impl Shape for MemberDto {
        const NAME: &'static str = "MemberDto";
        const FIELDS: &'static [ShapeField] = &[
            ShapeField::new("username", ValueType::String),
            ShapeField::new("age", ValueType::Int),
        ];

        fn assign(&mut self, field: &str, value: &Value) -> Result<(), QueryError> {
            match field {
                "username" => assign(&mut self.username, value),
                "age" => assign(&mut self.age, value),
                _ => Ok(()),
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct UserDto {
        pub name: String,
        pub age: i64,
    }

    impl Shape for UserDto {
        const NAME: &'static str = "UserDto";
        const FIELDS: &'static [ShapeField] = &[
            ShapeField::new("name", ValueType::String),
            ShapeField::new("age", ValueType::Int),
        ];

        fn assign(&mut self, field: &str, value: &Value) -> Result<(), QueryError> {
            match field {
                "name" => assign(&mut self.name, value),
                "age" => assign(&mut self.age, value),
                _ => Ok(()),
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct ScoreDto {
        pub name: String,
        pub score: f64,
    }

    impl Shape for ScoreDto {
        const NAME: &'static str = "ScoreDto";
        const FIELDS: &'static [ShapeField] = &[
            ShapeField::new("name", ValueType::String),
            ShapeField::new("score", ValueType::Float),
        ];

        fn assign(&mut self, field: &str, value: &Value) -> Result<(), QueryError> {
            match field {
                "name" => assign(&mut self.name, value),
                "score" => assign(&mut self.score, value),
                _ => Ok(()),
            }
        }
    }

    fn member() -> EntityPath {
        Schema::new()
            .with_entity(
                EntitySchema::new("Member")
                    .field("username", ValueType::String, true)
                    .field("age", ValueType::Int, false),
            )
            .entity("Member", "member")
            .unwrap()
    }

    #[test]
    fn field_binding_matches_by_name_and_drops_the_rest() {
        let m = member();
        let username: Expression<String> = m.path("username").unwrap();
        let age: Expression<i64> = m.path("age").unwrap();

        let unaliased = Projections::fields::<UserDto>([username.item(), age.item()]);
        let targets: Vec<_> = unaliased.targets().collect();
        assert_eq!(targets, vec![None, Some("age")]);

        let aliased = Projections::fields::<UserDto>([username.as_("name"), age.item()]);
        let targets: Vec<_> = aliased.targets().collect();
        assert_eq!(targets, vec![Some("name"), Some("age")]);
    }

    #[test]
    fn constructor_binding_checks_arity_and_types() {
        let m = member();
        let username: Expression<String> = m.path("username").unwrap();
        let age: Expression<i64> = m.path("age").unwrap();

        assert!(Projections::constructor::<MemberDto>([username.item(), age.item()]).is_ok());
        assert!(matches!(
            Projections::constructor::<MemberDto>([username.item()]),
            Err(QueryError::UnresolvedProjectionField { shape: "MemberDto", .. })
        ));
        assert!(matches!(
            Projections::constructor::<MemberDto>([age.item(), username.item()]),
            Err(QueryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            Projections::constructor::<MemberDto>([SelectItem::entity(&m), age.item()]),
            Err(QueryError::UnresolvedProjectionField { .. })
        ));
    }

    #[test]
    fn constructor_arguments_widen_but_never_narrow() {
        let m = member();
        let username: Expression<String> = m.path("username").unwrap();
        let age: Expression<i64> = m.path("age").unwrap();

        assert!(Projections::constructor::<ScoreDto>([username.item(), age.item()]).is_ok());
        assert!(Projections::constructor::<ScoreDto>([username.item(), age.avg().item()]).is_ok());
        assert!(matches!(
            Projections::constructor::<UserDto>([username.item(), age.to_float().item()]),
            Err(QueryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            Projections::constructor::<UserDto>([username.item(), age.avg().item()]),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn assign_helpers_handle_null() {
        let mut name = "keep".to_string();
        assign(&mut name, &Value::Null).unwrap();
        assert_eq!(name, "keep");
        let mut age = Some(3i64);
        assign_opt(&mut age, &Value::Null).unwrap();
        assert_eq!(age, None);
        assert!(assign(&mut name, &serde_json::json!(1)).is_err());
    }
}
