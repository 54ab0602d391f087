#![cfg(feature = "test-utils")]

use atm_data::prelude::*;
use atm_data::test_utils::{setup_postgres_embedded, stop_postgres_embedded};
use tokio::runtime::Runtime;

#[test]
fn test05_postgres_crud_and_credentials() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let embedded = setup_postgres_embedded("atm")?;
    let target = StoreTarget::from(embedded.target.clone());
    let credentials = embedded.credentials.clone();

    let rt = Runtime::new()?;
    let outcome = rt.block_on(async {
        // Wrong password: connect fails and the handle stays unprepared.
        let access = DataAccess::builder(target.clone())
            .credentials(Credentials::new(credentials.user(), "not-the-password"))
            .finish();
        let err = access.connect().await.unwrap_err();
        match &err {
            AtmDataError::ConnectionError { target, .. } => {
                assert!(!target.contains("not-the-password"));
                assert!(target.contains("password=****"));
            }
            other => panic!("expected connection error, got {other:?}"),
        }
        assert!(!access.is_connected().await);

        access.reconfigure(credentials.clone()).await;
        access.connect().await?;
        let handle = access.connection().await?;
        assert_eq!(handle.database_type, DatabaseType::Postgres);
        assert_eq!(handle.prepared_statements, QueryShape::ALL.len());
        handle.ping().await?;

        let mut ada = User::new(1234, "Ada", "Lovelace");
        access.save_user(&mut ada).await?;
        let id = ada.id().get().ok_or("id not assigned")?;
        assert!(id > 0);
        assert_eq!(access.get_user_by_id(id).await?, Some(ada.clone()));

        ada.set_first_name("Augusta Ada");
        access.save_user(&mut ada).await?;
        assert_eq!(ada.id().get(), Some(id));
        assert_eq!(access.get_users().await?, vec![ada.clone()]);

        let mut savings = Account::new(ada.clone(), "savings", 1024.75);
        access.save_account(&mut savings).await?;
        let account_id = savings.id().get().ok_or("account id not assigned")?;
        assert_eq!(access.get_account(account_id).await?, Some(savings.clone()));
        assert_eq!(access.get_all_accounts().await?, vec![savings]);

        assert!(access.get_user_by_id(id + 1000).await?.is_none());
        let mut loner = User::new(1, "Delete", "Me");
        access.save_user(&mut loner).await?;
        access.delete_user_by_id(loner.id().as_raw()).await?;
        access.delete_user_by_id(loner.id().as_raw()).await?;
        assert!(access.get_user_by_id(loner.id().as_raw()).await?.is_none());

        access.close().await;
        Ok::<_, Box<dyn std::error::Error>>(())
    });

    stop_postgres_embedded(embedded);
    outcome
}
