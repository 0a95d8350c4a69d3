use sea_orm::entity::prelude::*;

/// A catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub price: Decimal,
    pub description: Option<String>,
    /// URL of the cover image, if one was supplied.
    pub cover_image: Option<String>,
    pub stock_quantity: i32,
    /// The user who added this entry. Nullable so catalog rows survive
    /// removal of their creator; reads resolve it to a display name via a
    /// left join and tolerate the absence.
    pub created_by: Option<i32>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
