//! Follow entity for SeaORM.
//!
//! Both foreign keys point at `users`, so no `Related` impl is provided;
//! queries join explicitly through [`Relation::Follower`] or
//! [`Relation::Author`].

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "follows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Follower,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for posty_core::domain::Follow {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            author_id: model.author_id,
        }
    }
}

impl From<posty_core::domain::Follow> for ActiveModel {
    fn from(follow: posty_core::domain::Follow) -> Self {
        Self {
            id: Set(follow.id),
            user_id: Set(follow.user_id),
            author_id: Set(follow.author_id),
        }
    }
}
