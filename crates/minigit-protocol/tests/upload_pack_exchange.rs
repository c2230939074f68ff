//! End-to-end protocol tests over in-memory streams: advertisement →
//! negotiation request → side-band response.

use std::io::Cursor;

use minigit_hash::ObjectId;
use minigit_protocol::advert::parse_ref_advertisement;
use minigit_protocol::capability::negotiate_fetch_capabilities;
use minigit_protocol::fetch::{build_upload_pack_request, read_pack_response};
use minigit_protocol::pktline::{PktLineReader, PktLineWriter};

const OID: &str = "95d09f2b10159347eece71399a7e2e907ea3df4f";

/// What a smart-HTTP server sends for info/refs.
fn advertisement_body() -> Vec<u8> {
    let mut buf = Vec::new();
    let mut w = PktLineWriter::new(&mut buf);
    w.write_text("# service=git-upload-pack").unwrap();
    w.write_flush().unwrap();
    w.write_text(&format!(
        "{} HEAD\0multi_ack_detailed side-band-64k thin-pack ofs-delta symref=HEAD:refs/heads/main agent=git/2.43.0",
        OID
    ))
    .unwrap();
    w.write_text(&format!("{} refs/heads/main", OID)).unwrap();
    w.write_text(&format!("{} refs/heads/feature", OID)).unwrap();
    w.write_flush().unwrap();
    buf
}

#[test]
fn full_exchange_against_simulated_server() {
    // 1. Discovery.
    let mut reader = PktLineReader::new(Cursor::new(advertisement_body()));
    let (refs, caps) = parse_ref_advertisement(&mut reader).unwrap();
    assert_eq!(refs.len(), 3);
    assert!(caps.has("side-band-64k"));

    // 2. Negotiation request.
    let client_caps = negotiate_fetch_capabilities(&caps);
    assert!(client_caps.contains(&"side-band-64k".to_string()));

    let want = refs[0].0;
    let request = build_upload_pack_request(&[want], &client_caps).unwrap();
    let text = String::from_utf8_lossy(&request);
    assert!(text.contains(&format!("want {}", OID)));
    assert!(text.contains("side-band-64k"));
    assert!(text.contains("0000")); // flush between wants and done
    assert!(text.ends_with("done\n"));

    // 3. Server responds: NAK, progress, then the pack over band 1.
    let mut response = Vec::new();
    {
        let mut w = PktLineWriter::new(&mut response);
        w.write_line(b"NAK\n").unwrap();
        w.write_line(b"\x02Enumerating objects: 3, done.\n").unwrap();
        w.write_line(b"\x01PACK-first-half-").unwrap();
        w.write_line(b"\x02Compressing objects: 100%\n").unwrap();
        w.write_line(b"\x01second-half").unwrap();
        w.write_flush().unwrap();
    }

    let mut progress_lines = Vec::new();
    let mut progress = |m: &[u8]| progress_lines.push(String::from_utf8_lossy(m).to_string());
    let pack = read_pack_response(Cursor::new(response), &mut progress).unwrap();

    assert_eq!(pack, b"PACK-first-half-second-half");
    assert_eq!(progress_lines.len(), 2);
    assert!(progress_lines[0].starts_with("Enumerating"));
}

#[test]
fn remote_error_mid_stream_aborts() {
    let mut response = Vec::new();
    {
        let mut w = PktLineWriter::new(&mut response);
        w.write_line(b"NAK\n").unwrap();
        w.write_line(b"\x01PACKpartial").unwrap();
        w.write_line(b"\x03out of memory\n").unwrap();
    }

    let mut progress = |_: &[u8]| {};
    let err = read_pack_response(Cursor::new(response), &mut progress).unwrap_err();
    assert!(err.to_string().contains("out of memory"));
}

#[test]
fn advertisement_with_many_refs_keeps_order_and_oids() {
    let other = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    let mut buf = Vec::new();
    {
        let mut w = PktLineWriter::new(&mut buf);
        w.write_text("# service=git-upload-pack").unwrap();
        w.write_flush().unwrap();
        w.write_text(&format!("{} HEAD\0side-band-64k", OID)).unwrap();
        w.write_text(&format!("{} refs/heads/master", OID)).unwrap();
        w.write_text(&format!("{} refs/tags/v1.0", other)).unwrap();
        w.write_flush().unwrap();
    }

    let mut reader = PktLineReader::new(Cursor::new(buf));
    let (refs, _) = parse_ref_advertisement(&mut reader).unwrap();
    assert_eq!(refs.len(), 3);
    assert_eq!(refs[1].0, ObjectId::from_hex(OID).unwrap());
    assert_eq!(refs[2].0, ObjectId::from_hex(other).unwrap());
    assert_eq!(refs[2].1, "refs/tags/v1.0");
}
