//! End-to-end clone tests against an in-process smart-HTTP server.

mod common;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;

use common::minigit;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use minigit_hash::hasher::Hasher;
use minigit_hash::ObjectId;
use minigit_pack::delta::{encode_copy, encode_insert, write_varint};
use minigit_pack::entry::{encode_entry_header, encode_ofs_delta_offset};

// ──────────────────────────── wire helpers ────────────────────────────

fn pkt_line(data: &[u8]) -> Vec<u8> {
    let mut out = format!("{:04x}", data.len() + 4).into_bytes();
    out.extend_from_slice(data);
    out
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// The sample repository served by the test server.
struct SampleRepo {
    commit_oid: ObjectId,
    pack: Vec<u8>,
    file_content: &'static [u8],
    notes_content: Vec<u8>,
}

/// One commit, one tree, two blobs — one of them shipped as an OFS_DELTA.
fn build_sample_repo() -> SampleRepo {
    let file_content: &[u8] = b"hello minigit\n";
    let notes_base: &[u8] = b"some base notes";
    let notes_suffix: &[u8] = b", now extended\n";
    let mut notes_content = notes_base.to_vec();
    notes_content.extend_from_slice(notes_suffix);

    let file_oid = Hasher::hash_object("blob", file_content).unwrap();
    let notes_oid = Hasher::hash_object("blob", &notes_content).unwrap();

    let mut tree = Vec::new();
    tree.extend_from_slice(b"100644 file.txt\0");
    tree.extend_from_slice(file_oid.as_bytes());
    tree.extend_from_slice(b"100644 notes.txt\0");
    tree.extend_from_slice(notes_oid.as_bytes());
    let tree_oid = Hasher::hash_object("tree", &tree).unwrap();

    let commit = format!(
        "tree {}\nauthor Server <s@s> 1234567890 +0000\ncommitter Server <s@s> 1234567890 +0000\n\nserved commit\n",
        tree_oid.to_hex()
    );
    let commit_oid = Hasher::hash_object("commit", commit.as_bytes()).unwrap();

    // Delta reconstructing notes_content from notes_base.
    let mut delta = write_varint(notes_base.len());
    delta.extend_from_slice(&write_varint(notes_content.len()));
    delta.extend_from_slice(&encode_copy(0, notes_base.len()));
    delta.extend_from_slice(&encode_insert(notes_suffix));

    // Pack: commit, tree, file blob, notes base blob, OFS_DELTA on it.
    let mut pack = Vec::new();
    pack.extend_from_slice(b"PACK");
    pack.extend_from_slice(&2u32.to_be_bytes());
    pack.extend_from_slice(&5u32.to_be_bytes());

    for (type_num, content) in [
        (1u8, commit.as_bytes()),
        (2, tree.as_slice()),
        (3, file_content),
    ] {
        pack.extend_from_slice(&encode_entry_header(type_num, content.len() as u64));
        pack.extend_from_slice(&deflate(content));
    }

    let base_offset = pack.len() as u64;
    pack.extend_from_slice(&encode_entry_header(3, notes_base.len() as u64));
    pack.extend_from_slice(&deflate(notes_base));

    let delta_offset = pack.len() as u64;
    pack.extend_from_slice(&encode_entry_header(6, delta.len() as u64));
    pack.extend_from_slice(&encode_ofs_delta_offset(delta_offset - base_offset));
    pack.extend_from_slice(&deflate(&delta));

    let checksum = Hasher::digest(&pack).unwrap();
    pack.extend_from_slice(checksum.as_bytes());

    SampleRepo {
        commit_oid,
        pack,
        file_content,
        notes_content,
    }
}

// ──────────────────────────── test server ────────────────────────────

fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).unwrap_or(0);
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
        if let Some(header_end) = find_header_end(&request) {
            let content_length = parse_content_length(&request[..header_end]);
            if request.len() >= header_end + content_length {
                break;
            }
        }
    }
    request
}

fn find_header_end(request: &[u8]) -> Option<usize> {
    request
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| p + 4)
}

fn parse_content_length(headers: &[u8]) -> usize {
    let text = String::from_utf8_lossy(headers);
    for line in text.lines() {
        if let Some(value) = line
            .to_ascii_lowercase()
            .strip_prefix("content-length:")
            .map(str::trim)
            .map(String::from)
        {
            return value.parse().unwrap_or(0);
        }
    }
    0
}

fn respond(stream: &mut TcpStream, content_type: &str, body: &[u8]) {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        content_type,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}

/// Serve the sample repo's two smart-HTTP endpoints until the clone is done.
fn spawn_smart_server(advertisement: Vec<u8>, pack_response: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for _ in 0..4 {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let request = read_request(&mut stream);
            let request_line = String::from_utf8_lossy(&request);

            if request_line.starts_with("GET") && request_line.contains("/info/refs") {
                respond(
                    &mut stream,
                    "application/x-git-upload-pack-advertisement",
                    &advertisement,
                );
            } else if request_line.starts_with("POST") {
                respond(
                    &mut stream,
                    "application/x-git-upload-pack-result",
                    &pack_response,
                );
                return;
            }
        }
    });

    addr
}

fn spawn_html_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = read_request(&mut stream);
            respond(
                &mut stream,
                "text/html",
                b"<html><body>This is a web page, not a git server.</body></html>",
            );
        }
    });

    addr
}

// ──────────────────────────── tests ────────────────────────────

#[test]
fn clone_end_to_end_with_master_default() {
    let repo = build_sample_repo();
    let commit_hex = repo.commit_oid.to_hex();

    // Advertisement: service header section, then HEAD + master (no main).
    let mut advertisement = Vec::new();
    advertisement.extend_from_slice(&pkt_line(b"# service=git-upload-pack\n"));
    advertisement.extend_from_slice(b"0000");
    advertisement.extend_from_slice(&pkt_line(
        format!(
            "{} HEAD\0side-band-64k ofs-delta thin-pack agent=test/1.0\n",
            commit_hex
        )
        .as_bytes(),
    ));
    advertisement.extend_from_slice(&pkt_line(
        format!("{} refs/heads/master\n", commit_hex).as_bytes(),
    ));
    advertisement.extend_from_slice(b"0000");

    // Upload-pack response: NAK, progress on band 2, pack on band 1.
    let mut pack_response = Vec::new();
    pack_response.extend_from_slice(&pkt_line(b"NAK\n"));
    pack_response.extend_from_slice(&pkt_line(b"\x02Counting objects: 5, done.\n"));
    for chunk in repo.pack.chunks(60000) {
        let mut record = vec![1u8];
        record.extend_from_slice(chunk);
        pack_response.extend_from_slice(&pkt_line(&record));
    }
    pack_response.extend_from_slice(b"0000");

    let addr = spawn_smart_server(advertisement, pack_response);

    let dir = tempfile::tempdir().unwrap();
    let url = format!("http://{}/sample", addr);
    let result = minigit(dir.path(), &["clone", &url, "cloned"]);
    result.ok();

    let dest = dir.path().join("cloned");

    // Refs and HEAD (master selected because main is absent).
    assert_eq!(
        std::fs::read_to_string(dest.join(".git/HEAD")).unwrap(),
        "ref: refs/heads/master\n"
    );
    assert_eq!(
        std::fs::read_to_string(dest.join(".git/refs/heads/master")).unwrap(),
        format!("{}\n", commit_hex)
    );
    assert_eq!(
        std::fs::read_to_string(dest.join(".git/refs/remotes/origin/master")).unwrap(),
        format!("{}\n", commit_hex)
    );

    // Working tree, including the delta-resolved blob.
    assert_eq!(
        std::fs::read(dest.join("file.txt")).unwrap(),
        repo.file_content
    );
    assert_eq!(
        std::fs::read(dest.join("notes.txt")).unwrap(),
        repo.notes_content
    );

    // The commit object is persisted loose.
    let (prefix, rest) = commit_hex.split_at(2);
    assert!(dest
        .join(format!(".git/objects/{}/{}", prefix, rest))
        .is_file());
}

#[test]
fn clone_from_html_endpoint_fails_cleanly() {
    let addr = spawn_html_server();

    let dir = tempfile::tempdir().unwrap();
    let url = format!("http://{}/definitely-not-git", addr);
    let result = minigit(dir.path(), &["clone", &url, "cloned"]);

    assert_ne!(result.exit_code, 0);
    assert!(
        result.stderr.contains("smart"),
        "stderr should hint at a non-smart server: {}",
        result.stderr
    );
    // Nothing was created: no refs, no HEAD, no directory at all.
    assert!(!dir.path().join("cloned").exists());
}

#[test]
fn clone_refuses_non_empty_destination() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("cloned")).unwrap();
    std::fs::write(dir.path().join("cloned/occupied"), b"x").unwrap();

    let result = minigit(
        dir.path(),
        &["clone", "http://127.0.0.1:1/unreachable", "cloned"],
    );
    assert_ne!(result.exit_code, 0);
    assert!(result.stderr.contains("already exists"));
}
