//! `pandomap fields`: bit position of every address field.

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;

use pando_addrmap::AddressMap;
use pando_sysconfig::SystemConfig;

use crate::Format;

#[derive(Debug, Serialize)]
struct FieldRow {
    name: &'static str,
    hi: u32,
    lo: u32,
    bits: u32,
}

fn rows(map: &AddressMap) -> Vec<FieldRow> {
    map.layout()
        .fields()
        .map(|(name, field)| FieldRow {
            name: name.macro_name(),
            hi: field.hi(),
            lo: field.lo(),
            bits: field.bits(),
        })
        .collect()
}

/// Render the field table.
pub fn render(map: &AddressMap, format: Format) -> Result<String> {
    let rows = rows(map);
    if format == Format::Json {
        return Ok(serde_json::to_string_pretty(&rows)? + "\n");
    }

    let topology = map.topology();
    let mut out = String::new();
    writeln!(
        out,
        "Address fields for {} pxns x {} pods x {} cores:",
        topology.pxns, topology.pods, topology.cores
    )?;
    writeln!(out)?;
    writeln!(out, "  {:<24} {:>3} {:>3} {:>5}", "FIELD", "HI", "LO", "BITS")?;
    for row in &rows {
        if row.bits == 0 {
            writeln!(out, "  {:<24} {:>3} {:>3} {:>5}", row.name, "-", "-", 0)?;
        } else {
            writeln!(
                out,
                "  {:<24} {:>3} {:>3} {:>5}",
                row.name, row.hi, row.lo, row.bits
            )?;
        }
    }
    Ok(out)
}

/// Print the field table for `system`.
pub fn run(system: &SystemConfig, format: Format) -> Result<()> {
    let map = system.address_map()?;
    print!("{}", render(&map, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pando_addrmap::{FieldName, TopologyConfig};

    fn map() -> AddressMap {
        AddressMap::new(&TopologyConfig::new(2, 4, 8)).unwrap()
    }

    #[test]
    fn text_table() {
        let out = render(&map(), Format::Text).unwrap();
        assert!(out.starts_with("Address fields for 2 pxns x 4 pods x 8 cores:"));
        assert_eq!(out.lines().count(), 3 + FieldName::ALL.len());
        let pod = out.lines().find(|l| l.trim_start().starts_with("ABSOLUTE_POD ")).unwrap();
        let cols: Vec<_> = pod.split_whitespace().collect();
        assert_eq!(cols, ["ABSOLUTE_POD", "59", "58", "2"]);
    }

    #[test]
    fn empty_fields_are_dashed() {
        let m = AddressMap::new(&TopologyConfig::new(1, 1, 1)).unwrap();
        let out = render(&m, Format::Text).unwrap();
        let pxn = out.lines().find(|l| l.trim_start().starts_with("ABSOLUTE_PXN ")).unwrap();
        assert_eq!(pxn.split_whitespace().collect::<Vec<_>>(), ["ABSOLUTE_PXN", "-", "-", "0"]);
    }

    #[test]
    fn json_rows() {
        let out = render(&map(), Format::Json).unwrap();
        let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), FieldName::ALL.len());
        assert_eq!(rows[0]["name"], "IS_ABSOLUTE");
        assert_eq!(rows[0]["hi"], 63);
        assert_eq!(rows[0]["bits"], 1);
    }
}
