//! Note composer behavior against the in-memory store: creation with mixed
//! references, inverse-index maintenance, and the update-diff path.

use uuid::Uuid;

use grimoire_db::{
    ComposeNoteRequest, Database, Error, FolderStore, NoteComposer, NoteFilter, NoteStore,
    RefInput, TagStore,
};

fn setup() -> (Database, NoteComposer, Uuid) {
    let db = Database::in_memory();
    let composer = db.composer();
    (db, composer, Uuid::new_v4())
}

fn note_request(title: &str) -> ComposeNoteRequest {
    ComposeNoteRequest {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_requires_title() {
    let (_db, composer, owner) = setup();

    let err = composer
        .create(owner, ComposeNoteRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingTitle));

    let err = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("  ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingTitle));
}

#[tokio::test]
async fn test_create_with_preexisting_ids_keeps_exact_sets() {
    let (db, composer, owner) = setup();
    let tag_a = db.tags.create(owner, "a").await.unwrap();
    let tag_b = db.tags.create(owner, "b").await.unwrap();
    let folder = db.folders.create(owner, "inbox").await.unwrap();

    let note = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("n".into()),
                tags: Some(vec![
                    RefInput::by_id(tag_a.id.to_string()),
                    RefInput::by_id(tag_b.id.to_string()),
                ]),
                folders: Some(vec![RefInput::by_id(folder.id.to_string())]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let tag_ids: Vec<Uuid> = note.tags.iter().map(|t| t.id).collect();
    assert_eq!(tag_ids.len(), 2);
    assert!(tag_ids.contains(&tag_a.id) && tag_ids.contains(&tag_b.id));
    assert_eq!(note.folders.len(), 1);
    assert_eq!(note.folders[0].id, folder.id);
}

#[tokio::test]
async fn test_create_appends_note_id_to_each_folder() {
    let (db, composer, owner) = setup();

    let note = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("filed".into()),
                folders: Some(vec![RefInput::by_name("work"), RefInput::by_name("play")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    for folder in &note.folders {
        let stored = db
            .folders
            .find_by_id(folder.id, owner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.note_ids, vec![note.id]);
    }
}

#[tokio::test]
async fn test_create_fails_atomically_on_bad_reference() {
    let (db, composer, owner) = setup();
    let stranger_folder = db.folders.create(Uuid::new_v4(), "theirs").await.unwrap();

    let err = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("doomed".into()),
                folders: Some(vec![RefInput::by_id(stranger_folder.id.to_string())]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidReference(_)));

    // No half-created note.
    let notes = db.notes.find_many(NoteFilter::for_owner(owner)).await.unwrap();
    assert!(notes.is_empty());
}

#[tokio::test]
async fn test_update_preserves_refs_when_absent_and_clears_on_empty() {
    let (db, composer, owner) = setup();
    let created = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("n".into()),
                tags: Some(vec![RefInput::by_name("keep")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Absent tags → unchanged.
    let updated = composer
        .update(owner, created.id, note_request("renamed"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.tags.len(), 1);
    assert_eq!(updated.title, "renamed");

    // Empty tags → cleared.
    let cleared = composer
        .update(
            owner,
            created.id,
            ComposeNoteRequest {
                title: Some("renamed".into()),
                tags: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(cleared.tags.is_empty());
    // The tag row itself survives; only the reference goes.
    assert_eq!(db.tags.list(owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_diffs_folder_sets_both_ways() {
    let (db, composer, owner) = setup();
    let keep = db.folders.create(owner, "keep").await.unwrap();
    let drop = db.folders.create(owner, "drop").await.unwrap();
    let gain = db.folders.create(owner, "gain").await.unwrap();

    let note = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("moving".into()),
                folders: Some(vec![
                    RefInput::by_id(keep.id.to_string()),
                    RefInput::by_id(drop.id.to_string()),
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    composer
        .update(
            owner,
            note.id,
            ComposeNoteRequest {
                title: Some("moving".into()),
                folders: Some(vec![
                    RefInput::by_id(keep.id.to_string()),
                    RefInput::by_id(gain.id.to_string()),
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    let keep = db.folders.find_by_id(keep.id, owner).await.unwrap().unwrap();
    let dropped = db.folders.find_by_id(drop.id, owner).await.unwrap().unwrap();
    let gained = db.folders.find_by_id(gain.id, owner).await.unwrap().unwrap();
    assert_eq!(keep.note_ids, vec![note.id]);
    assert!(dropped.note_ids.is_empty());
    assert_eq!(gained.note_ids, vec![note.id]);
}

#[tokio::test]
async fn test_update_of_missing_note_is_a_miss_not_an_error() {
    let (_db, composer, owner) = setup();

    let result = composer
        .update(owner, Uuid::new_v4(), note_request("ghost"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_update_cannot_touch_foreign_notes() {
    let (_db, composer, owner) = setup();
    let stranger = Uuid::new_v4();
    let note = composer
        .create(stranger, note_request("private"))
        .await
        .unwrap();

    let result = composer
        .update(owner, note.id, note_request("hijacked"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_removes_note_without_touching_tags_or_folders() {
    let (db, composer, owner) = setup();
    let note = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("short-lived".into()),
                tags: Some(vec![RefInput::by_name("t")]),
                folders: Some(vec![RefInput::by_name("f")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(composer.delete(owner, note.id).await.unwrap());
    assert!(!composer.delete(owner, note.id).await.unwrap());

    // Tag and folder rows stay; note deletion does not cascade.
    assert_eq!(db.tags.list(owner).await.unwrap().len(), 1);
    assert_eq!(db.folders.list(owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_sorts_most_recently_updated_first() {
    let (_db, composer, owner) = setup();
    let first = composer.create(owner, note_request("first")).await.unwrap();
    let _second = composer.create(owner, note_request("second")).await.unwrap();

    // Touch the older note; it should move to the front.
    composer
        .update(owner, first.id, note_request("first-touched"))
        .await
        .unwrap()
        .unwrap();

    let notes = composer.list(NoteFilter::for_owner(owner)).await.unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "first-touched");
}

#[tokio::test]
async fn test_list_filters_by_folder_and_tag() {
    let (_db, composer, owner) = setup();
    let filed = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("filed".into()),
                tags: Some(vec![RefInput::by_name("urgent")]),
                folders: Some(vec![RefInput::by_name("work")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    composer.create(owner, note_request("loose")).await.unwrap();

    let mut filter = NoteFilter::for_owner(owner);
    filter.folder_id = Some(filed.folders[0].id);
    let by_folder = composer.list(filter).await.unwrap();
    assert_eq!(by_folder.len(), 1);
    assert_eq!(by_folder[0].id, filed.id);

    let mut filter = NoteFilter::for_owner(owner);
    filter.tag_id = Some(filed.tags[0].id);
    let by_tag = composer.list(filter).await.unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].id, filed.id);
}

#[tokio::test]
async fn test_expansion_returns_full_entities() {
    let (_db, composer, owner) = setup();
    let note = composer
        .create(
            owner,
            ComposeNoteRequest {
                title: Some("expanded".into()),
                tags: Some(vec![RefInput::by_name("alpha")]),
                folders: Some(vec![RefInput::by_name("beta")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let fetched = composer.get(owner, note.id).await.unwrap().unwrap();
    assert_eq!(fetched.tags[0].name, "alpha");
    assert_eq!(fetched.folders[0].name, "beta");
    assert_eq!(fetched.tags[0].owner_id, owner);
}

#[tokio::test]
async fn test_get_is_owner_scoped() {
    let (_db, composer, owner) = setup();
    let stranger = Uuid::new_v4();
    let note = composer
        .create(stranger, note_request("private"))
        .await
        .unwrap();

    assert!(composer.get(owner, note.id).await.unwrap().is_none());
    assert!(composer.get(stranger, note.id).await.unwrap().is_some());
}
