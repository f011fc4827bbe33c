//! Admin access tests: throttled login, staff management, and account
//! moderation including the delete cascade.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlx::PgPool;
    use uuid::Uuid;

    use sayara_server::admin::{AdminRole, AdminService, CreateAdminRequest};
    use sayara_server::auth::{
        AuthService, GoogleTokenVerifier, InMemoryThrottleStore, ThrottlePolicy,
    };
    use sayara_server::error::ApiError;
    use sayara_server::listings::{
        AdminStatusRequest, CreateListingRequest, ListingService,
    };
    use sayara_server::models::{AccountRole, RegisterRequest};
    use sayara_server::offers::{CreateOfferRequest, OfferService};

    /// Helper to create a test database pool with migrations applied
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/sayara_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn admin_service(pool: &PgPool) -> AdminService {
        let throttle = Arc::new(InMemoryThrottleStore::new(ThrottlePolicy {
            max_attempts: 3,
            block_duration: chrono::Duration::minutes(5),
        }));
        AdminService::new(
            pool.clone(),
            "test-secret".to_string(),
            7,
            throttle,
            "./test-uploads".to_string(),
        )
    }

    fn auth_service(pool: &PgPool) -> AuthService {
        AuthService::new(
            pool.clone(),
            "test-secret".to_string(),
            30,
            false,
            GoogleTokenVerifier::new(None),
        )
    }

    fn unique_email() -> String {
        format!("staff-{}@sayara.app", Uuid::new_v4().simple())
    }

    fn unique_phone() -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("t{}", &id[..15])
    }

    async fn create_employee(admins: &AdminService, email: &str) -> Uuid {
        let created = admins
            .create_admin(CreateAdminRequest {
                email: email.to_string(),
                name: "Queue Reviewer".to_string(),
                password: "password123".to_string(),
                role: AdminRole::Employee,
                permissions: vec!["cars".to_string()],
            })
            .await
            .expect("admin creation should succeed");
        created.id
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_admin_login_throttles_after_repeated_failures() {
        let pool = setup_test_db().await;
        let admins = admin_service(&pool);

        let email = unique_email();
        create_employee(&admins, &email).await;

        let identifier = format!("device-{}", Uuid::new_v4().simple());
        for _ in 0..3 {
            let err = admins
                .login(&email, "wrong-password", &identifier)
                .await
                .expect_err("wrong password must fail");
            assert!(matches!(err, ApiError::Unauthorized(_)));
        }

        // Blocked now, even with the correct password
        let err = admins
            .login(&email, "password123", &identifier)
            .await
            .expect_err("blocked identifier must be rejected");
        match err {
            ApiError::TemporarilyBlocked { minutes } => {
                assert!((1..=5).contains(&minutes), "got {} minutes", minutes)
            }
            other => panic!("expected TemporarilyBlocked, got {:?}", other),
        }

        // A different identifier is unaffected
        let fresh = format!("device-{}", Uuid::new_v4().simple());
        let response = admins
            .login(&email, "password123", &fresh)
            .await
            .expect("login from a fresh identifier should succeed");
        assert_eq!(response.admin.email, email);
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_successful_login_resets_failure_count() {
        let pool = setup_test_db().await;
        let admins = admin_service(&pool);

        let email = unique_email();
        create_employee(&admins, &email).await;
        let identifier = format!("device-{}", Uuid::new_v4().simple());

        for _ in 0..2 {
            let _ = admins.login(&email, "wrong-password", &identifier).await;
        }
        admins
            .login(&email, "password123", &identifier)
            .await
            .expect("login under the limit should succeed");

        // The counter was cleared; two more failures stay under the limit
        for _ in 0..2 {
            let _ = admins.login(&email, "wrong-password", &identifier).await;
        }
        admins
            .login(&email, "password123", &identifier)
            .await
            .expect("login should succeed after the counter reset");
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_admin_login_rejects_unknown_and_blocked() {
        let pool = setup_test_db().await;
        let admins = admin_service(&pool);

        // Unknown email gets the same generic message as a wrong password
        let err = admins
            .login(&unique_email(), "password123", "x")
            .await
            .expect_err("unknown email must fail");
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let email = unique_email();
        let admin_id = create_employee(&admins, &email).await;
        sqlx::query("UPDATE admins SET is_active = FALSE WHERE id = $1")
            .bind(admin_id)
            .execute(&pool)
            .await
            .expect("deactivation should succeed");

        let err = admins
            .login(&email, "password123", "y")
            .await
            .expect_err("deactivated admin must not log in");
        assert!(matches!(err, ApiError::AccountBlocked));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_create_admin_rejects_unknown_capabilities() {
        let pool = setup_test_db().await;
        let admins = admin_service(&pool);

        let err = admins
            .create_admin(CreateAdminRequest {
                email: unique_email(),
                name: "Typo Victim".to_string(),
                password: "password123".to_string(),
                role: AdminRole::Employee,
                permissions: vec!["cars".to_string(), "spaceships".to_string()],
            })
            .await
            .expect_err("unknown capability must be rejected");
        match err {
            ApiError::BadRequest(message) => assert!(message.contains("spaceships")),
            other => panic!("expected BadRequest, got {:?}", other),
        }

        let email = unique_email();
        create_employee(&admins, &email).await;
        let err = admins
            .create_admin(CreateAdminRequest {
                email: email.clone(),
                name: "Duplicate".to_string(),
                password: "password123".to_string(),
                role: AdminRole::Employee,
                permissions: vec![],
            })
            .await
            .expect_err("duplicate email must be rejected");
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_authenticate_distinguishes_blocked_and_missing() {
        let pool = setup_test_db().await;
        let admins = admin_service(&pool);

        let email = unique_email();
        let admin_id = create_employee(&admins, &email).await;

        let admin = admins
            .authenticate(admin_id)
            .await
            .expect("active admin should authenticate");
        assert_eq!(admin.email, email);
        assert!(admin.last_seen.is_some(), "authenticate must touch last_seen");

        sqlx::query("UPDATE admins SET is_active = FALSE WHERE id = $1")
            .bind(admin_id)
            .execute(&pool)
            .await
            .expect("deactivation should succeed");
        let err = admins
            .authenticate(admin_id)
            .await
            .expect_err("blocked admin must not authenticate");
        assert!(matches!(err, ApiError::AccountBlocked));

        let err = admins
            .authenticate(Uuid::new_v4())
            .await
            .expect_err("missing admin must not authenticate");
        assert!(matches!(err, ApiError::UserDeleted));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_blocked_account_cannot_login() {
        let pool = setup_test_db().await;
        let admins = admin_service(&pool);
        let auth = auth_service(&pool);

        let phone = unique_phone();
        let tokens = auth
            .register(RegisterRequest {
                phone: phone.clone(),
                name: "Soon Blocked".to_string(),
                password: "password123".to_string(),
                roles: None,
            })
            .await
            .expect("registration should succeed");

        let blocked = admins
            .set_account_active(tokens.user.id, false)
            .await
            .expect("blocking should succeed");
        assert!(!blocked.is_active);

        let err = auth
            .login(&phone, "password123")
            .await
            .expect_err("blocked account must not log in");
        assert!(matches!(err, ApiError::AccountBlocked));

        admins
            .set_account_active(tokens.user.id, true)
            .await
            .expect("unblocking should succeed");
        auth.login(&phone, "password123")
            .await
            .expect("unblocked account should log in");
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_account_delete_cascades() {
        let pool = setup_test_db().await;
        let admins = admin_service(&pool);
        let auth = auth_service(&pool);
        let listings = ListingService::new(pool.clone(), "./test-uploads".to_string());
        let offers = OfferService::new(pool.clone());

        let seller = auth
            .register(RegisterRequest {
                phone: unique_phone(),
                name: "Leaving Seller".to_string(),
                password: "password123".to_string(),
                roles: Some(vec![AccountRole::Seller]),
            })
            .await
            .expect("registration should succeed")
            .user
            .id;
        let buyer = auth
            .register(RegisterRequest {
                phone: unique_phone(),
                name: "Staying Buyer".to_string(),
                password: "password123".to_string(),
                roles: None,
            })
            .await
            .expect("registration should succeed")
            .user
            .id;

        let listing = listings
            .create(
                seller,
                CreateListingRequest {
                    title: "2016 Hilux".to_string(),
                    description: String::new(),
                    category: "pickup".to_string(),
                    price: 80_000,
                    images: vec![],
                },
            )
            .await
            .expect("listing creation should succeed");
        listings
            .admin_set_status(
                listing.id,
                Uuid::new_v4(),
                &AdminStatusRequest {
                    is_active: Some(true),
                    is_featured: None,
                },
            )
            .await
            .expect("activation should succeed");

        listings
            .add_favorite(buyer, listing.id)
            .await
            .expect("favorite should succeed");
        offers
            .create_offer(
                buyer,
                &CreateOfferRequest {
                    listing_id: listing.id,
                    amount: 75_000,
                },
            )
            .await
            .expect("offer should succeed");

        admins
            .delete_account(seller)
            .await
            .expect("account delete should succeed");

        let err = listings
            .get(listing.id)
            .await
            .expect_err("listing must be gone after owner deletion");
        assert!(matches!(err, ApiError::NotFound(_)));

        let saved = listings
            .list_favorites(buyer)
            .await
            .expect("favorites listing should succeed");
        assert!(
            saved.iter().all(|l| l.id != listing.id),
            "favorites of deleted listings must be scrubbed"
        );

        let orphaned_offers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM offers WHERE listing_id = $1")
                .bind(listing.id)
                .fetch_one(&pool)
                .await
                .expect("count should succeed");
        assert_eq!(orphaned_offers, 0, "offers on deleted listings must be scrubbed");

        // The buyer is untouched
        auth.get_account(buyer)
            .await
            .expect("unrelated account must survive the cascade");

        let err = admins
            .delete_account(seller)
            .await
            .expect_err("second delete must report missing account");
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
