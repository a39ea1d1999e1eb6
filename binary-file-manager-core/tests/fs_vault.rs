use tempfile::tempdir;

use binary_file_manager_core::contract::{Vault, VaultEntry};
use binary_file_manager_core::error::VaultError;
use binary_file_manager_core::vault::FsVault;

#[tokio::test]
async fn lookup_distinguishes_files_folders_and_missing_paths() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("Inbox")).unwrap();
    std::fs::write(dir.path().join("Inbox/scan.pdf"), "pdf").unwrap();
    let vault = FsVault::new(dir.path());

    match vault.lookup("Inbox/scan.pdf").await {
        Some(VaultEntry::File(file)) => {
            assert_eq!(file.path, "Inbox/scan.pdf");
            assert_eq!(file.name, "scan.pdf");
            assert_eq!(file.basename, "scan");
            assert_eq!(file.extension, "pdf");
        }
        other => panic!("expected a file, got {other:?}"),
    }
    assert_eq!(
        vault.lookup("/Inbox/").await,
        Some(VaultEntry::Folder {
            path: "Inbox".to_string()
        })
    );
    assert_eq!(vault.lookup("Inbox/missing.pdf").await, None);
}

#[tokio::test]
async fn create_makes_parents_and_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let vault = FsVault::new(dir.path());

    vault.create("Meta/deep/note.md", "hello").await.unwrap();
    assert_eq!(vault.read("Meta/deep/note.md").await.unwrap(), "hello");

    let err = vault.create("Meta/deep/note.md", "again").await.unwrap_err();
    assert!(matches!(err, VaultError::AlreadyExists(p) if p == "Meta/deep/note.md"));
    assert_eq!(vault.read("Meta/deep/note.md").await.unwrap(), "hello");
}

#[tokio::test]
async fn modify_requires_an_existing_file() {
    let dir = tempdir().unwrap();
    let vault = FsVault::new(dir.path());

    assert!(matches!(
        vault.modify("note.md", "x").await,
        Err(VaultError::NotFound(_))
    ));
    vault.create("note.md", "").await.unwrap();
    vault.modify("note.md", "rendered").await.unwrap();
    assert_eq!(vault.read("note.md").await.unwrap(), "rendered");
}

#[tokio::test]
async fn rename_moves_into_new_folders_but_never_overwrites() {
    let dir = tempdir().unwrap();
    let vault = FsVault::new(dir.path());
    vault.create("Inbox/a.png", "first").await.unwrap();
    vault.create("Inbox/b.png", "second").await.unwrap();

    vault.rename("Inbox/a.png", "Attachments/a.png").await.unwrap();
    assert!(vault.lookup("Inbox/a.png").await.is_none());
    assert_eq!(vault.read("Attachments/a.png").await.unwrap(), "first");

    let err = vault
        .rename("Inbox/b.png", "Attachments/a.png")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::AlreadyExists(_)));
    assert_eq!(vault.read("Attachments/a.png").await.unwrap(), "first");
    assert_eq!(vault.read("Inbox/b.png").await.unwrap(), "second");

    assert!(matches!(
        vault.rename("Inbox/none.png", "x.png").await,
        Err(VaultError::NotFound(_))
    ));
}

#[tokio::test]
async fn list_files_is_sorted_and_skips_dot_entries() {
    let dir = tempdir().unwrap();
    let vault = FsVault::new(dir.path());
    vault.create("z.md", "").await.unwrap();
    vault.create("Attachments/b.png", "").await.unwrap();
    vault.create("Attachments/a.png", "").await.unwrap();
    vault.create(".obsidian/plugins/data.json", "{}").await.unwrap();
    vault.create("Inbox/.hidden.png", "").await.unwrap();

    let listed: Vec<String> = vault
        .list_files()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.path)
        .collect();
    assert_eq!(listed, vec!["Attachments/a.png", "Attachments/b.png", "z.md"]);
}

#[test]
fn vault_paths_round_trip_through_absolute_locations() {
    let vault = FsVault::new("/vault");
    let abs = vault.absolute("Inbox//photo.png");
    assert_eq!(abs, std::path::PathBuf::from("/vault/Inbox/photo.png"));
    assert_eq!(vault.vault_path(&abs).as_deref(), Some("Inbox/photo.png"));
    assert_eq!(vault.vault_path(std::path::Path::new("/elsewhere/x.png")), None);
}
