#![cfg(feature = "sqlite")]

mod common;

use atm_data::prelude::*;
use tokio::runtime::Runtime;

#[test]
fn test01_save_assigns_id_and_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    common::init_tracing();
    let db = common::scratch_db()?;
    let rt = Runtime::new()?;
    rt.block_on(async {
        let access = DataAccess::builder(db.target()).connect().await?;

        let mut ada = User::new(1234, "Ada", "Lovelace");
        assert!(ada.id().is_new());
        access.save_user(&mut ada).await?;
        let id = ada.id().get().ok_or("id not assigned")?;
        assert!(id > 0);

        let fetched = access.get_user_by_id(id).await?.ok_or("user missing")?;
        assert_eq!(fetched, ada);
        assert_eq!(fetched.pin(), 1234);
        assert_eq!(fetched.first_name(), "Ada");
        assert_eq!(fetched.last_name(), "Lovelace");
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}

#[test]
fn test01_update_keeps_id() -> Result<(), Box<dyn std::error::Error>> {
    let db = common::scratch_db()?;
    let rt = Runtime::new()?;
    rt.block_on(async {
        let access = DataAccess::builder(db.target()).connect().await?;

        let mut user = User::new(1111, "Grace", "Hopper");
        access.save_user(&mut user).await?;
        let id = user.id();

        user.set_pin(2222);
        user.set_last_name("Murray Hopper");
        access.save_user(&mut user).await?;
        assert_eq!(user.id(), id);

        let fetched = access
            .get_user_by_id(id.as_raw())
            .await?
            .ok_or("user missing")?;
        assert_eq!(fetched.pin(), 2222);
        assert_eq!(fetched.last_name(), "Murray Hopper");
        assert_eq!(access.get_users().await?.len(), 1);
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}

#[test]
fn test01_update_of_missing_id_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let db = common::scratch_db()?;
    let rt = Runtime::new()?;
    rt.block_on(async {
        let access = DataAccess::builder(db.target()).connect().await?;

        let mut ghost = User::with_id(999_i64, 1, "No", "Body");
        access.save_user(&mut ghost).await?;
        assert_eq!(ghost.id(), EntityId::Persisted(999));
        assert!(access.get_user_by_id(999).await?.is_none());
        assert!(access.get_users().await?.is_empty());
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}

#[test]
fn test01_absent_and_delete_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let db = common::scratch_db()?;
    let rt = Runtime::new()?;
    rt.block_on(async {
        let access = DataAccess::builder(db.target()).connect().await?;

        assert!(access.get_user_by_id(42).await?.is_none());

        let mut user = User::new(4321, "Alan", "Turing");
        access.save_user(&mut user).await?;
        let id = user.id().as_raw();

        access.delete_user_by_id(id).await?;
        assert!(access.get_user_by_id(id).await?.is_none());
        access.delete_user_by_id(id).await?;
        access.delete_user_by_id(123_456).await?;
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}

#[test]
fn test01_get_users_returns_stored_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = common::scratch_db()?;
    let rt = Runtime::new()?;
    rt.block_on(async {
        let access = DataAccess::builder(db.target()).connect().await?;

        let mut saved = vec![
            User::new(1000, "Ada", "Lovelace"),
            User::new(2000, "Edsger", "Dijkstra"),
            User::new(3000, "Barbara", "Liskov"),
        ];
        for user in &mut saved {
            access.save_user(user).await?;
        }

        let listed = access.get_users().await?;
        assert_eq!(listed, saved);

        let ids: Vec<i64> = listed.iter().filter_map(|u| u.id().get()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}

#[test]
fn test01_calls_before_connect_fail_fast() -> Result<(), Box<dyn std::error::Error>> {
    let db = common::scratch_db()?;
    let rt = Runtime::new()?;
    rt.block_on(async {
        let access = DataAccess::builder(db.target()).finish();
        let mut user = User::new(1, "a", "b");

        let err = access.save_user(&mut user).await.unwrap_err();
        assert!(matches!(err, AtmDataError::NotConnectedError { operation: "save_user" }));
        assert!(user.id().is_new());

        let err = access.get_users().await.unwrap_err();
        assert_eq!(err.operation(), Some("get_users"));
        assert!(matches!(
            access.connection().await,
            Err(AtmDataError::NotConnectedError { .. })
        ));
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}
