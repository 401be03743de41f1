#![cfg(feature = "inmem-store")]

use propfolio::models::{
    CaptureMode, LeadKind, NewLead, NewListing, NewPropertyView, UpdateListing, UpdateProfile,
};
use propfolio::repo::{inmem::InMemRepo, RepoError};
// Bring trait method namespaces into scope so calls on InMemRepo resolve.
use propfolio::repo::{LeadRepo, ListingRepo, ProfileRepo, ViewRepo};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Helper that returns a fresh, empty repository for every test run.
fn repo() -> InMemRepo {
    // isolate state: do **not** persist to the default file path
    std::env::set_var("PROPFOLIO_DATA_DIR", tempfile::tempdir().unwrap().path());
    InMemRepo::new()
}

fn new_listing(title: &str) -> NewListing {
    NewListing {
        title: title.into(),
        price: Decimal::new(450_000, 0),
        description: "Three bed, two bath".into(),
        location: "Austin, TX".into(),
        primary_image_url: None,
        image_urls: vec![],
        capture_mode: CaptureMode::Both,
    }
}

fn new_lead(property_id: Uuid, name: &str) -> NewLead {
    NewLead {
        property_id,
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: None,
        message: Some("Is this still available?".into()),
        kind: LeadKind::Interest,
    }
}

#[tokio::test]
async fn create_then_list_round_trip() {
    let r = repo();
    let owner = Uuid::new_v4();

    assert!(r.list_listings(None).await.unwrap().is_empty());

    let created = r.create_listing(owner, new_listing("Lakeview house")).await.unwrap();

    let listed = r.list_listings(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    let got = &listed[0];
    assert_eq!(got.id, created.id);
    assert_eq!(got.title, "Lakeview house");
    assert_eq!(got.price, Decimal::new(450_000, 0));
    assert_eq!(got.location, "Austin, TX");
    assert_eq!(got.description, "Three bed, two bath");
    assert_eq!(got.owner_id, owner);
    assert_eq!(got.created_at, got.updated_at);
}

#[tokio::test]
async fn create_rejects_missing_required_fields() {
    let r = repo();
    let owner = Uuid::new_v4();

    let mut no_title = new_listing("x");
    no_title.title = "  ".into();
    assert!(matches!(
        r.create_listing(owner, no_title).await.unwrap_err(),
        RepoError::Validation(_)
    ));

    let mut no_location = new_listing("x");
    no_location.location = String::new();
    assert!(matches!(
        r.create_listing(owner, no_location).await.unwrap_err(),
        RepoError::Validation(_)
    ));

    let mut free = new_listing("x");
    free.price = Decimal::ZERO;
    assert!(matches!(
        r.create_listing(owner, free).await.unwrap_err(),
        RepoError::Validation(_)
    ));
}

#[tokio::test]
async fn update_changes_only_named_fields() {
    let r = repo();
    let owner = Uuid::new_v4();
    let l = r.create_listing(owner, new_listing("Before")).await.unwrap();

    let updated = r
        .update_listing(
            l.id,
            UpdateListing { title: Some("After".into()), ..Default::default() },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "After");
    // frame: everything else untouched
    assert_eq!(updated.price, l.price);
    assert_eq!(updated.location, l.location);
    assert_eq!(updated.description, l.description);
    assert_eq!(updated.owner_id, l.owner_id);
    assert_eq!(updated.created_at, l.created_at);
    assert!(updated.updated_at >= l.updated_at);

    // unknown id
    let err = r
        .update_listing(Uuid::new_v4(), UpdateListing::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn primary_image_must_be_one_of_the_images() {
    let r = repo();
    let owner = Uuid::new_v4();

    let mut bad = new_listing("x");
    bad.primary_image_url = Some("https://img.example/a.jpg".into());
    assert!(matches!(
        r.create_listing(owner, bad).await.unwrap_err(),
        RepoError::Validation(_)
    ));

    let mut good = new_listing("x");
    good.image_urls = vec!["https://img.example/a.jpg".into()];
    good.primary_image_url = Some("https://img.example/a.jpg".into());
    let l = r.create_listing(owner, good).await.unwrap();

    // replacing the image list must not strand the primary
    let err = r
        .update_listing(
            l.id,
            UpdateListing { image_urls: Some(vec![]), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let r = repo();
    let owner = Uuid::new_v4();
    let l = r.create_listing(owner, new_listing("Going")).await.unwrap();

    r.delete_listing(l.id).await.unwrap();
    assert!(r.list_listings(None).await.unwrap().is_empty());
    // second delete: no error
    r.delete_listing(l.id).await.unwrap();
    // unknown id: also a no-op
    r.delete_listing(Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn leads_survive_listing_deletion() {
    let r = repo();
    let owner = Uuid::new_v4();
    let l = r.create_listing(owner, new_listing("Orphan maker")).await.unwrap();
    r.create_lead(new_lead(l.id, "Ada")).await.unwrap();

    r.delete_listing(l.id).await.unwrap();

    // soft-orphan: the lead row is still there
    let leads = r.list_leads(Some(l.id)).await.unwrap();
    assert_eq!(leads.len(), 1);
}

#[tokio::test]
async fn lead_creation_requires_an_existing_listing() {
    let r = repo();
    let owner = Uuid::new_v4();
    let l = r.create_listing(owner, new_listing("Target")).await.unwrap();

    let mut anonymous = new_lead(l.id, "Ada");
    anonymous.name = String::new();
    assert!(matches!(
        r.create_lead(anonymous).await.unwrap_err(),
        RepoError::Validation(_)
    ));

    assert!(matches!(
        r.create_lead(new_lead(Uuid::new_v4(), "Bob")).await.unwrap_err(),
        RepoError::NotFound
    ));

    let lead = r.create_lead(new_lead(l.id, "Cara")).await.unwrap();
    assert_eq!(lead.property_id, l.id);
}

#[tokio::test]
async fn lead_listing_is_newest_first_and_filterable() {
    let r = repo();
    let owner = Uuid::new_v4();
    let a = r.create_listing(owner, new_listing("A")).await.unwrap();
    let b = r.create_listing(owner, new_listing("B")).await.unwrap();

    let first = r.create_lead(new_lead(a.id, "One")).await.unwrap();
    let second = r.create_lead(new_lead(b.id, "Two")).await.unwrap();
    let third = r.create_lead(new_lead(a.id, "Three")).await.unwrap();

    let all = r.list_leads(None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, third.id);
    assert_eq!(all[2].id, first.id);

    let only_a = r.list_leads(Some(a.id)).await.unwrap();
    assert_eq!(only_a.len(), 2);
    assert!(only_a.iter().all(|l| l.property_id == a.id));
    assert_eq!(only_a[0].id, third.id);

    assert_eq!(r.count_leads(&[a.id]).await.unwrap(), 2);
    assert_eq!(r.count_leads(&[a.id, b.id]).await.unwrap(), 3);
    assert_eq!(r.recent_leads(&[a.id, b.id], 2).await.unwrap().len(), 2);
    assert_eq!(r.recent_leads(&[a.id, b.id], 2).await.unwrap()[0].id, third.id);
    let _ = second;
}

#[tokio::test]
async fn views_are_append_only_and_countable() {
    let r = repo();
    let owner = Uuid::new_v4();
    let l = r.create_listing(owner, new_listing("Viewed")).await.unwrap();

    // anonymous viewer allowed
    r.record_view(NewPropertyView { property_id: l.id, viewer_id: None }).await.unwrap();
    r.record_view(NewPropertyView { property_id: l.id, viewer_id: Some(Uuid::new_v4()) })
        .await
        .unwrap();

    assert!(matches!(
        r.record_view(NewPropertyView { property_id: Uuid::new_v4(), viewer_id: None })
            .await
            .unwrap_err(),
        RepoError::NotFound
    ));

    assert_eq!(r.count_views(&[l.id]).await.unwrap(), 2);
    assert_eq!(r.list_views(Some(l.id)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn profile_upsert_then_get() {
    let r = repo();
    let owner = Uuid::new_v4();

    assert!(matches!(r.get_profile(owner).await.unwrap_err(), RepoError::NotFound));

    let p = r
        .upsert_profile(
            owner,
            UpdateProfile {
                display_name: Some("Jess Realty".into()),
                email: Some("jess@example.com".into()),
                phone: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(p.id, owner);
    assert_eq!(p.display_name, "Jess Realty");

    // partial update leaves other fields alone
    let p2 = r
        .upsert_profile(
            owner,
            UpdateProfile { phone: Some(Some("555-0100".into())), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(p2.display_name, "Jess Realty");
    assert_eq!(p2.phone.as_deref(), Some("555-0100"));

    // `phone: Some(None)` is an explicit clear, distinct from "not provided"
    let p3 = r
        .upsert_profile(owner, UpdateProfile { phone: Some(None), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(p3.phone, None);
    assert_eq!(p3.display_name, "Jess Realty");
}

#[tokio::test]
async fn owner_scoped_listing_queries() {
    let r = repo();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let a = r.create_listing(alice, new_listing("Alice's")).await.unwrap();
    r.create_listing(bob, new_listing("Bob's")).await.unwrap();

    let scoped = r.list_listings(Some(alice)).await.unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].id, a.id);

    let ids = r.list_listing_ids(alice).await.unwrap();
    assert_eq!(ids, vec![a.id]);
}
