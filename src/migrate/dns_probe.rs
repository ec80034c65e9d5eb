//! Minimal DNS wire format for the redirection self-test: one A query, A answers only.

use std::net::Ipv4Addr;

const TYPE_A: u16 = 1;
const CLASS_IN: u16 = 1;
const FLAG_RECURSION_DESIRED: u16 = 0x0100;

/// Encode a standard query for the A record of `name`.
pub fn build_query(id: u16, name: &str) -> Vec<u8> {
    let mut packet = Vec::with_capacity(18 + name.len());
    packet.extend_from_slice(&id.to_be_bytes());
    packet.extend_from_slice(&FLAG_RECURSION_DESIRED.to_be_bytes());
    packet.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
    packet.extend_from_slice(&[0, 0, 0, 0, 0, 0]); // AN/NS/AR counts
    for label in name.trim_end_matches('.').split('.').filter(|l| !l.is_empty()) {
        let bytes = label.as_bytes();
        packet.push(bytes.len().min(63) as u8);
        packet.extend_from_slice(&bytes[..bytes.len().min(63)]);
    }
    packet.push(0);
    packet.extend_from_slice(&TYPE_A.to_be_bytes());
    packet.extend_from_slice(&CLASS_IN.to_be_bytes());
    packet
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16, String> {
    buf.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| "truncated response".to_string())
}

/// Offset just past the (possibly compressed) name starting at `at`.
fn skip_name(buf: &[u8], mut at: usize) -> Result<usize, String> {
    loop {
        let len = *buf.get(at).ok_or("truncated name")?;
        if len & 0xC0 == 0xC0 {
            return Ok(at + 2);
        }
        if len == 0 {
            return Ok(at + 1);
        }
        at += 1 + usize::from(len);
    }
}

/// A-record addresses in a response to query `id`.
pub fn parse_response(buf: &[u8], id: u16) -> Result<Vec<Ipv4Addr>, String> {
    if read_u16(buf, 0)? != id {
        return Err("response id does not match query".to_string());
    }
    let flags = read_u16(buf, 2)?;
    let rcode = flags & 0x000F;
    if rcode != 0 {
        return Err(format!("server returned rcode {rcode}"));
    }
    let questions = read_u16(buf, 4)?;
    let answers = read_u16(buf, 6)?;

    let mut at = 12;
    for _ in 0..questions {
        at = skip_name(buf, at)? + 4;
    }

    let mut addrs = Vec::new();
    for _ in 0..answers {
        at = skip_name(buf, at)?;
        let rtype = read_u16(buf, at)?;
        let rdlen = usize::from(read_u16(buf, at + 8)?);
        let rdata = buf
            .get(at + 10..at + 10 + rdlen)
            .ok_or_else(|| "truncated record".to_string())?;
        if rtype == TYPE_A && rdlen == 4 {
            addrs.push(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]));
        }
        at += 10 + rdlen;
    }
    Ok(addrs)
}

/// Octal escapes for `printf`, which every speaker shell understands.
pub fn printf_escape(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("\\{b:03o}")).collect()
}

/// Bytes from `od -An -tx1` output.
pub fn parse_od_hex(output: &str) -> Vec<u8> {
    output
        .split_whitespace()
        .filter(|tok| tok.len() == 2)
        .filter_map(|tok| u8::from_str_radix(tok, 16).ok())
        .collect()
}
