//! This file serves as the root for all SeaORM entity modules.
//! The bookstore keeps its whole persisted state in two tables: `users`
//! (accounts with an authorization role) and `books` (the catalog, each row
//! optionally pointing back at the account that created it).

pub mod book;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::book::Entity as Book;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, FromQueryResult, JoinType, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
        RelationTrait, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn user_fixture(name: &str, email: &str, role: user::Role) -> user::ActiveModel {
        user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password: Set("$2b$10$not-a-real-hash".to_string()),
            role: Set(role),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
    }

    fn book_fixture(title: &str, created_by: Option<i32>) -> book::ActiveModel {
        book::ActiveModel {
            title: Set(title.to_string()),
            author: Set("Anonymous".to_string()),
            isbn: Set(None),
            price: Set(Decimal::new(1999, 2)), // 19.99
            description: Set(None),
            cover_image: Set(None),
            stock_quantity: Set(5),
            created_by: Set(created_by),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
    }

    /// Row shape produced by the catalog's left join onto `users`.
    #[derive(Debug, FromQueryResult)]
    struct BookWithCreator {
        id: i32,
        title: String,
        created_by: Option<i32>,
        created_by_name: Option<String>,
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let admin = user_fixture("Admin User", "admin@bookstore.com", user::Role::Admin)
            .insert(&db)
            .await?;
        let reader = user_fixture("Reader", "reader@example.com", user::Role::User)
            .insert(&db)
            .await?;

        let owned = book_fixture("The Rust Programming Language", Some(admin.id))
            .insert(&db)
            .await?;
        let orphan = book_fixture("Anonymous Donation", None).insert(&db).await?;

        // Verify users
        let users = User::find().all(&db).await?;
        assert_eq!(users.len(), 2);
        assert!(users.iter().any(|u| u.email == "admin@bookstore.com"));
        assert!(users.iter().any(|u| u.role == user::Role::User && u.id == reader.id));

        // Verify books and the creator relation
        let books = Book::find().all(&db).await?;
        assert_eq!(books.len(), 2);
        assert_eq!(books.iter().find(|b| b.id == owned.id).unwrap().created_by, Some(admin.id));

        let creator = owned.find_related(User).one(&db).await?;
        assert_eq!(creator.map(|u| u.name), Some("Admin User".to_string()));

        // The read-side join resolves a display name, or null for orphans
        let joined = Book::find()
            .column_as(user::Column::Name, "created_by_name")
            .join(JoinType::LeftJoin, book::Relation::User.def())
            .order_by_asc(book::Column::Id)
            .into_model::<BookWithCreator>()
            .all(&db)
            .await?;
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].created_by_name, Some("Admin User".to_string()));
        assert_eq!(joined[1].created_by_name, None);
        assert_eq!(joined[1].title, "Anonymous Donation");

        Ok(())
    }

    #[tokio::test]
    async fn test_email_uniqueness_enforced() -> Result<(), DbErr> {
        let db = setup_db().await?;

        user_fixture("First", "dup@example.com", user::Role::User)
            .insert(&db)
            .await?;
        let second = user_fixture("Second", "dup@example.com", user::Role::User)
            .insert(&db)
            .await;
        assert!(second.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_creator_nulls_book_reference() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let admin = user_fixture("Admin User", "admin@bookstore.com", user::Role::Admin)
            .insert(&db)
            .await?;
        let book = book_fixture("Soon Orphaned", Some(admin.id)).insert(&db).await?;

        User::delete_by_id(admin.id).exec(&db).await?;

        let reloaded = Book::find_by_id(book.id)
            .one(&db)
            .await?
            .expect("book must survive creator deletion");
        assert_eq!(reloaded.created_by, None);

        let joined = Book::find()
            .filter(book::Column::Id.eq(book.id))
            .column_as(user::Column::Name, "created_by_name")
            .join(JoinType::LeftJoin, book::Relation::User.def())
            .into_model::<BookWithCreator>()
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(joined.created_by_name, None);

        Ok(())
    }
}
