use bstr::BString;
use minigit_hash::ObjectId;
use minigit_object::{Blob, Commit, FileMode, Object, ObjectType, Tag, Tree, TreeEntry};
use minigit_utils::date::{GitDate, Signature};

fn sig(name: &str, email: &str, ts: i64) -> Signature {
    Signature {
        name: BString::from(name),
        email: BString::from(email),
        date: GitDate {
            timestamp: ts,
            tz_offset: 0,
        },
    }
}

#[test]
fn blob_roundtrip() {
    let obj = Object::Blob(Blob::new(b"hello world\n".to_vec()));
    let serialized = obj.serialize();
    let parsed = Object::parse(&serialized).unwrap();
    assert_eq!(parsed, obj);
}

#[test]
fn empty_blob_roundtrip() {
    let obj = Object::Blob(Blob::new(vec![]));
    let serialized = obj.serialize();
    let parsed = Object::parse(&serialized).unwrap();
    assert_eq!(parsed, obj);
}

#[test]
fn blob_with_null_bytes_roundtrip() {
    let obj = Object::Blob(Blob::new(b"\0\0\0binary\0data\0".to_vec()));
    let serialized = obj.serialize();
    let parsed = Object::parse(&serialized).unwrap();
    assert_eq!(parsed, obj);
}

#[test]
fn tree_roundtrip_is_sorted() {
    let oid1 = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
    let oid2 = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();

    let obj = Object::Tree(Tree {
        entries: vec![
            TreeEntry {
                mode: FileMode::Tree,
                name: BString::from("src"),
                oid: oid1,
            },
            TreeEntry {
                mode: FileMode::Regular,
                name: BString::from("README.md"),
                oid: oid1,
            },
            TreeEntry {
                mode: FileMode::Executable,
                name: BString::from("run.sh"),
                oid: oid2,
            },
        ],
    });

    let serialized = obj.serialize();
    let parsed = Object::parse(&serialized).unwrap();
    let Object::Tree(t) = &parsed else {
        panic!("expected Tree");
    };
    assert_eq!(t.entries.len(), 3);
    // Byte-wise ascending name order in the serialized form.
    assert_eq!(t.entries[0].name, "README.md");
    assert_eq!(t.entries[1].name, "run.sh");
    assert_eq!(t.entries[2].name, "src");
}

#[test]
fn empty_tree_roundtrip() {
    let obj = Object::Tree(Tree::new());
    let serialized = obj.serialize();
    let parsed = Object::parse(&serialized).unwrap();
    assert_eq!(parsed, obj);
}

#[test]
fn empty_tree_well_known_oid() {
    let obj = Object::Tree(Tree::new());
    assert_eq!(
        obj.compute_oid().unwrap().to_hex(),
        "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
    );
}

#[test]
fn commit_roundtrip() {
    let tree = ObjectId::from_hex("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();
    let parent = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();

    let obj = Object::Commit(Commit {
        tree,
        parents: vec![parent],
        author: sig("Author", "author@example.com", 1234567890),
        committer: sig("Committer", "committer@example.com", 1234567891),
        extra_headers: Vec::new(),
        message: BString::from("A commit message\n\nWith a body.\n"),
    });

    let serialized = obj.serialize();
    let parsed = Object::parse(&serialized).unwrap();
    assert_eq!(parsed, obj);
}

#[test]
fn tag_roundtrip() {
    let target = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();

    let obj = Object::Tag(Tag {
        target,
        target_type: ObjectType::Commit,
        tag_name: BString::from("v0.1.0"),
        tagger: Some(sig("Tagger", "tag@example.com", 1234567890)),
        message: BString::from("First release\n"),
    });

    let serialized = obj.serialize();
    let parsed = Object::parse(&serialized).unwrap();
    assert_eq!(parsed, obj);
}

#[test]
fn oid_stable_across_serializations() {
    let obj = Object::Blob(Blob::new(b"identity is a pure function of content".to_vec()));
    let first = obj.compute_oid().unwrap();
    let second = Object::parse(&obj.serialize()).unwrap().compute_oid().unwrap();
    assert_eq!(first, second);
}
