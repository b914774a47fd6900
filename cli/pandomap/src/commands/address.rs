//! `pandomap decode` and `pandomap encode`: single address conversion.

use std::fmt::Write;

use anyhow::{Context, Result};

use pando_addrmap::{AddressInfo, AddressMap, AddressMode, AddressType, CoreId};
use pando_sysconfig::SystemConfig;

/// Parse an integer written in decimal, `0x` hex, or `0b` binary.
/// Underscores between digits are ignored.
pub fn parse_u64(s: &str) -> std::result::Result<u64, String> {
    let cleaned: String = s.trim().chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2)
    } else {
        lower.parse()
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

/// Describe `raw` as seen by core `issuer`.
pub fn render_decode(map: &AddressMap, raw: u64, issuer: CoreId) -> Result<String> {
    let info = map.decode(raw, issuer);
    let mut out = String::new();
    writeln!(out, "0x{raw:016x} {info}")?;
    if info.is_relative() {
        let absolute = map
            .to_absolute(raw, issuer)
            .with_context(|| format!("resolving against {issuer}"))?;
        writeln!(
            out,
            "  from {issuer}: 0x{absolute:016x} {}",
            map.decode(absolute, issuer)
        )?;
    }
    Ok(out)
}

/// Print the decoded form of `raw`.
pub fn decode(system: &SystemConfig, raw: u64, issuer: CoreId) -> Result<()> {
    let map = system.address_map()?;
    print!("{}", render_decode(&map, raw, issuer)?);
    Ok(())
}

/// Encode an address from its parts.
pub fn encode_parts(
    map: &AddressMap,
    kind: AddressType,
    mode: AddressMode,
    offset: u64,
    [pxn, pod, core]: [Option<u64>; 3],
) -> Result<u64> {
    let mut builder = AddressInfo::builder()
        .set_type(kind)
        .set_mode(mode)
        .set_offset(offset);
    if let Some(pxn) = pxn {
        builder = builder.set_pxn(pxn);
    }
    if let Some(pod) = pod {
        builder = builder.set_pod(pod);
    }
    if let Some(core) = core {
        builder = builder.set_core(core);
    }
    Ok(map.encode(builder)?)
}

/// Print the encoded form of an address.
pub fn encode(
    system: &SystemConfig,
    kind: AddressType,
    mode: AddressMode,
    offset: u64,
    coordinates: [Option<u64>; 3],
) -> Result<()> {
    let map = system.address_map()?;
    let raw = encode_parts(&map, kind, mode, offset, coordinates)?;
    println!("0x{raw:016x}");
    Ok(())
}
