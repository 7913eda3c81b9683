//! Registration, invitation and customer management, and customer login
//! against in-memory SurrealDB.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use undangan_auth::HashCost;
use undangan_core::error::UndanganError;
use undangan_core::models::customer::{CreateCustomer, CustomerStatus};
use undangan_core::models::invitation::{InvitationFilter, PublishState, UpdateInvitation};
use undangan_core::repository::{CustomerRepository, InvitationRepository, Pagination};
use undangan_db::repository::{
    SurrealCustomerRepository, SurrealInvitationRepository, SurrealRegistrationStore,
};
use undangan_tenancy::{
    AdminCustomerService, AdminInvitationService, CustomerAuthService, CustomerInvitationService,
    NewInvitation, RegisterInput, RegistrationService, TenancyConfig,
};
use uuid::Uuid;

type Customers = SurrealCustomerRepository<Db>;
type Invitations = SurrealInvitationRepository<Db>;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    undangan_db::run_migrations(&db).await.unwrap();
    db
}

fn config() -> TenancyConfig {
    TenancyConfig::new(Some("example.com")).with_hash_cost(Some(HashCost {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }))
}

fn registration(db: &Surreal<Db>) -> RegistrationService<Customers, SurrealRegistrationStore<Db>> {
    RegistrationService::new(
        SurrealCustomerRepository::new(db.clone()),
        SurrealRegistrationStore::new(db.clone()),
        config(),
    )
}

fn admin(db: &Surreal<Db>) -> AdminInvitationService<Customers, Invitations> {
    AdminInvitationService::new(
        SurrealCustomerRepository::new(db.clone()),
        SurrealInvitationRepository::new(db.clone()),
        config(),
    )
}

fn register_input(email: &str, slug: Option<&str>) -> RegisterInput {
    RegisterInput {
        full_name: "Budi Santoso".into(),
        email: email.into(),
        password: "rahasia123".into(),
        slug: slug.map(str::to_string),
        title: "Budi & Sinta".into(),
        ..Default::default()
    }
}

fn admin_customers(db: &Surreal<Db>) -> AdminCustomerService<Customers> {
    AdminCustomerService::new(SurrealCustomerRepository::new(db.clone()))
}

async fn mark_paid(db: &Surreal<Db>, customer_id: Uuid) {
    admin_customers(db)
        .set_status(customer_id, CustomerStatus::Paid)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_creates_customer_and_invitation() {
    let db = setup().await;
    let out = registration(&db)
        .register(register_input(" Budi@Example.com ", None))
        .await
        .unwrap();

    assert_eq!(out.slug, "budi-sinta");
    assert_eq!(out.domain, "budi-sinta.example.com");

    let customer = SurrealCustomerRepository::new(db.clone())
        .get_by_id(out.customer_id)
        .await
        .unwrap();
    assert_eq!(customer.email, "budi@example.com");
    assert_eq!(customer.status, CustomerStatus::Pending);
    assert_eq!(customer.domain.as_deref(), Some("budi-sinta.example.com"));
    assert_ne!(customer.password_hash, "rahasia123");

    let invitation = SurrealInvitationRepository::new(db)
        .get_by_id(out.invitation_id)
        .await
        .unwrap();
    assert_eq!(invitation.customer_id, out.customer_id);
    assert_eq!(invitation.theme_key, "elegant");
    assert_eq!(invitation.search_name, "budi & sinta");
    assert!(!invitation.is_published);
    assert_eq!(invitation.content["couple"]["groomName"], "Budi");
    assert_eq!(invitation.content["couple"]["groomFullName"], "Budi Santoso");
}

#[tokio::test]
async fn register_suffixes_taken_domains() {
    let db = setup().await;
    let service = registration(&db);

    let first = service
        .register(register_input("a@example.com", Some("Budi Sinta")))
        .await
        .unwrap();
    let second = service
        .register(register_input("b@example.com", Some("budi-sinta")))
        .await
        .unwrap();
    let third = service
        .register(register_input("c@example.com", None))
        .await
        .unwrap();

    assert_eq!(first.slug, "budi-sinta");
    assert_eq!(second.slug, "budi-sinta-2");
    assert_eq!(second.domain, "budi-sinta-2.example.com");
    assert_eq!(third.slug, "budi-sinta-3");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_all_get_a_domain() {
    const SIGNUPS: usize = 12;

    let db = setup().await;
    let service = Arc::new(registration(&db));

    let mut tasks = tokio::task::JoinSet::new();
    for n in 0..SIGNUPS {
        let service = Arc::clone(&service);
        tasks.spawn(async move {
            service
                .register(register_input(&format!("guest{n}@example.com"), Some("budi-sinta")))
                .await
        });
    }

    let mut slugs = HashSet::new();
    while let Some(joined) = tasks.join_next().await {
        let out = joined.unwrap().unwrap();
        assert_eq!(out.domain, format!("{}.example.com", out.slug));
        assert!(slugs.insert(out.slug), "slug handed out twice");
    }

    let expected: HashSet<String> = (0..SIGNUPS)
        .map(|n| undangan_core::slug::slug_candidate("budi-sinta", n))
        .collect();
    assert_eq!(slugs, expected);
}

#[tokio::test]
async fn register_falls_back_to_name_then_fixed_word() {
    let db = setup().await;
    let service = registration(&db);

    let mut input = register_input("a@example.com", Some("***"));
    input.title = "   ".into();
    let out = service.register(input).await.unwrap();
    assert_eq!(out.slug, "budi-santoso");

    let mut input = register_input("b@example.com", None);
    input.title = "!!!".into();
    input.full_name = "???".into();
    let out = service.register(input).await.unwrap();
    assert_eq!(out.slug, "undangan");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let db = setup().await;
    let service = registration(&db);

    service
        .register(register_input("a@example.com", Some("one")))
        .await
        .unwrap();
    let err = service
        .register(register_input("A@example.com", Some("two")))
        .await
        .unwrap_err();
    assert!(err.is_conflict_on("email"), "got {err:?}");

    assert!(
        !SurrealCustomerRepository::new(db)
            .exists_by_domain("two.example.com")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn register_requires_credentials() {
    let db = setup().await;
    let mut input = register_input("a@example.com", None);
    input.password = "   ".into();

    let err = registration(&db).register(input).await.unwrap_err();
    assert!(matches!(err, UndanganError::Validation { .. }));
}

// ---------------------------------------------------------------------------
// Admin invitations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_create_requires_a_paid_customer() {
    let db = setup().await;
    let out = registration(&db)
        .register(register_input("a@example.com", None))
        .await
        .unwrap();
    let service = admin(&db);

    let input = NewInvitation {
        customer_id: out.customer_id,
        title: "Ngunduh Mantu".into(),
        ..Default::default()
    };
    let err = service.create(input.clone()).await.unwrap_err();
    assert!(matches!(err, UndanganError::CustomerNotPaid { .. }));

    let err = service
        .create(NewInvitation {
            customer_id: Uuid::new_v4(),
            ..input.clone()
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    mark_paid(&db, out.customer_id).await;
    let created = service.create(input).await.unwrap();
    assert_eq!(created.slug, "ngunduh-mantu");
    assert_eq!(created.content, serde_json::json!({}));
    assert_eq!(created.search_name, "ngunduh mantu");
}

#[tokio::test]
async fn admin_slugs_are_unique_within_the_customer() {
    let db = setup().await;
    let out = registration(&db)
        .register(register_input("a@example.com", None))
        .await
        .unwrap();
    mark_paid(&db, out.customer_id).await;
    let service = admin(&db);
    tokio::time::sleep(Duration::from_millis(5)).await;

    let created = service
        .create(NewInvitation {
            customer_id: out.customer_id,
            slug: Some("budi-sinta".into()),
            title: "Resepsi".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.slug, "budi-sinta-2");

    let page = service
        .list(InvitationFilter::for_customer(out.customer_id), 0, 0)
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.limit, Pagination::DEFAULT_LIMIT);
    assert_eq!(page.items[0].id, created.id);
    assert_eq!(page.items[1].id, out.invitation_id);

    let page = service
        .list(InvitationFilter::for_customer(out.customer_id), 0, 1_000)
        .await
        .unwrap();
    assert_eq!(page.limit, Pagination::MAX_LIMIT);

    service.delete(created.id).await.unwrap();
    assert!(service.get(created.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn admin_publish_at_creation_claims_an_empty_domain() {
    let db = setup().await;
    let customer = SurrealCustomerRepository::new(db.clone())
        .create(CreateCustomer {
            full_name: "Sinta".into(),
            email: "s@example.com".into(),
            password_hash: "hash".into(),
            domain: None,
            status: CustomerStatus::Paid,
        })
        .await
        .unwrap();

    admin(&db)
        .create(NewInvitation {
            customer_id: customer.id,
            title: "Sinta & Budi".into(),
            is_published: true,
            ..Default::default()
        })
        .await
        .unwrap();

    let customer = SurrealCustomerRepository::new(db)
        .get_by_id(customer.id)
        .await
        .unwrap();
    assert_eq!(customer.domain.as_deref(), Some("sinta-budi.example.com"));
}

#[tokio::test]
async fn admin_listing_filters_and_attaches_owners() {
    let db = setup().await;
    registration(&db)
        .register(register_input("a@example.com", None))
        .await
        .unwrap();
    let mut rina = register_input("b@example.com", Some("rina-dimas"));
    rina.full_name = "Rina Wulandari".into();
    rina.title = "Rina & Dimas".into();
    rina.event_date = Some(Utc.with_ymd_and_hms(2030, 9, 1, 9, 0, 0).unwrap());
    let rina = registration(&db).register(rina).await.unwrap();
    let service = admin(&db);

    let page = service
        .list_with_customer(
            InvitationFilter {
                query: Some("dimas".into()),
                ..Default::default()
            },
            0,
            0,
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let row = &page.items[0];
    assert_eq!(row.invitation.id, rina.invitation_id);
    assert_eq!(row.customer_name, "Rina Wulandari");
    assert_eq!(row.customer_domain.as_deref(), Some("rina-dimas.example.com"));

    let page = service
        .list(
            InvitationFilter {
                event_to: Some(Utc.with_ymd_and_hms(2030, 12, 31, 0, 0, 0).unwrap()),
                ..Default::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, rina.invitation_id);

    let page = service
        .list(
            InvitationFilter {
                state: Some(PublishState::Draft),
                ..Default::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    // Owner removed out from under the invitation.
    let orphan = SurrealInvitationRepository::new(db.clone())
        .create(undangan_core::models::invitation::CreateInvitation {
            customer_id: Uuid::new_v4(),
            slug: "orphan".into(),
            title: "Orphan".into(),
            search_name: "orphan".into(),
            event_date: None,
            theme_key: "elegant".into(),
            is_published: false,
            content: None,
        })
        .await
        .unwrap();
    let page = service
        .list_with_customer(
            InvitationFilter {
                query: Some("orphan".into()),
                ..Default::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(page.items[0].invitation.id, orphan.id);
    assert_eq!(page.items[0].customer_name, "");
    assert!(page.items[0].customer_domain.is_none());
}

// ---------------------------------------------------------------------------
// Admin customers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_lists_customers_newest_first() {
    let db = setup().await;
    let first = registration(&db)
        .register(register_input("a@example.com", Some("one")))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = registration(&db)
        .register(register_input("b@example.com", Some("two")))
        .await
        .unwrap();

    let listed = admin_customers(&db).list(0).await.unwrap();
    assert_eq!(
        listed.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![second.customer_id, first.customer_id]
    );
    assert_eq!(admin_customers(&db).list(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn admin_status_change_opens_the_paid_gate() {
    let db = setup().await;
    let out = registration(&db)
        .register(register_input("a@example.com", None))
        .await
        .unwrap();
    let customers = admin_customers(&db);

    let trial = customers
        .set_status(out.customer_id, CustomerStatus::Trial)
        .await
        .unwrap();
    assert_eq!(trial.status, CustomerStatus::Trial);
    let input = NewInvitation {
        customer_id: out.customer_id,
        title: "Resepsi".into(),
        ..Default::default()
    };
    assert!(matches!(
        admin(&db).create(input.clone()).await.unwrap_err(),
        UndanganError::CustomerNotPaid { .. }
    ));

    customers
        .set_status(out.customer_id, CustomerStatus::Paid)
        .await
        .unwrap();
    admin(&db).create(input).await.unwrap();

    let err = customers
        .set_status(Uuid::new_v4(), CustomerStatus::Paid)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn admin_assigns_and_clears_domains() {
    let db = setup().await;
    let budi = registration(&db)
        .register(register_input("a@example.com", Some("budi")))
        .await
        .unwrap();
    let rina = registration(&db)
        .register(register_input("b@example.com", Some("rina")))
        .await
        .unwrap();
    let customers = admin_customers(&db);

    let updated = customers
        .set_domain(budi.customer_id, Some(" MyWedding.com:443 "))
        .await
        .unwrap();
    assert_eq!(updated.domain.as_deref(), Some("mywedding.com"));

    let err = customers
        .set_domain(rina.customer_id, Some("mywedding.com"))
        .await
        .unwrap_err();
    assert!(err.is_conflict_on("domain"), "got {err:?}");
    assert_eq!(
        customers.get(rina.customer_id).await.unwrap().domain.as_deref(),
        Some("rina.example.com")
    );

    let err = customers
        .set_domain(rina.customer_id, Some("bad host/path"))
        .await
        .unwrap_err();
    assert!(matches!(err, UndanganError::Validation { .. }));

    let cleared = customers.set_domain(budi.customer_id, Some("  ")).await.unwrap();
    assert!(cleared.domain.is_none());
    customers
        .set_domain(budi.customer_id, Some("budi-baru.example.com"))
        .await
        .unwrap();
    let cleared = customers.set_domain(budi.customer_id, None).await.unwrap();
    assert!(cleared.domain.is_none());
}

// ---------------------------------------------------------------------------
// Customer side
// ---------------------------------------------------------------------------

#[tokio::test]
async fn customer_login_opens_the_newest_invitation() {
    let db = setup().await;
    let out = registration(&db)
        .register(register_input("a@example.com", None))
        .await
        .unwrap();
    let auth = CustomerAuthService::new(
        SurrealCustomerRepository::new(db.clone()),
        SurrealInvitationRepository::new(db.clone()),
        config(),
    );

    let login = auth.login(" A@EXAMPLE.com", " rahasia123 ").await.unwrap();
    assert_eq!(login.customer.id, out.customer_id);
    assert_eq!(login.invitation.id, out.invitation_id);
    assert_eq!(login.invitation.slug, "budi-sinta");

    mark_paid(&db, out.customer_id).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = admin(&db)
        .create(NewInvitation {
            customer_id: out.customer_id,
            title: "Ngunduh Mantu".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let login = auth.login("a@example.com", "rahasia123").await.unwrap();
    assert_eq!(login.invitation.id, newer.id);

    let wrong = auth.login("a@example.com", "nope").await.unwrap_err();
    let unknown = auth.login("z@example.com", "rahasia123").await.unwrap_err();
    assert!(matches!(wrong, UndanganError::InvalidCredentials));
    assert!(matches!(unknown, UndanganError::InvalidCredentials));
}

#[tokio::test]
async fn customer_without_invitation_cannot_log_in() {
    let db = setup().await;
    let out = registration(&db)
        .register(register_input("a@example.com", None))
        .await
        .unwrap();
    SurrealInvitationRepository::new(db.clone())
        .delete(out.invitation_id)
        .await
        .unwrap();

    let auth = CustomerAuthService::new(
        SurrealCustomerRepository::new(db.clone()),
        SurrealInvitationRepository::new(db),
        config(),
    );
    let err = auth.login("a@example.com", "rahasia123").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn published_content_is_only_served_once_published() {
    let db = setup().await;
    let out = registration(&db)
        .register(register_input("a@example.com", None))
        .await
        .unwrap();
    let service = CustomerInvitationService::new(
        SurrealCustomerRepository::new(db.clone()),
        SurrealInvitationRepository::new(db.clone()),
        config(),
    );

    assert!(
        service
            .published_content(out.customer_id, "budi-sinta")
            .await
            .unwrap()
            .is_none()
    );

    service
        .update(
            out.customer_id,
            out.invitation_id,
            UpdateInvitation {
                is_published: Some(true),
                content: Some(serde_json::json!({"story": "met in Bandung"})),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let content = service
        .published_content(out.customer_id, "budi-sinta")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(content, serde_json::json!({"story": "met in Bandung"}));
    assert!(
        service
            .published_content(Uuid::new_v4(), "budi-sinta")
            .await
            .unwrap()
            .is_none()
    );

    let listed = service.list(out.customer_id, 0, 10).await.unwrap();
    assert_eq!(listed.total, 1);
}
