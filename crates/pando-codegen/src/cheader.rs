//! C header with the bit position of every address field.
//!
//! Each field `NAME` becomes a pair of macros:
//!
//! ```c
//! #define NAME_HI 60ul
//! #define NAME_LO 58ul
//! ```
//!
//! A field the topology leaves empty has `NAME_HI == NAME_LO - 1`.

use std::fmt;

use pando_addrmap::{AddressMap, Bitfield, FieldName};

const GUARD: &str = "__DRV_ADDRESS_MAP_H__";

/// Renders the address map header.
#[derive(Debug, Clone, Copy)]
pub struct CHeaderBuilder<'a> {
    map: &'a AddressMap,
}

impl<'a> CHeaderBuilder<'a> {
    pub fn new(map: &'a AddressMap) -> Self {
        Self { map }
    }

    /// The complete header text.
    pub fn build(&self) -> String {
        let header = self.to_string();
        log::debug!(
            "rendered C header for {:?} ({} bytes)",
            self.map.topology(),
            header.len()
        );
        header
    }

    fn section(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        select: impl Fn(FieldName) -> bool,
    ) -> fmt::Result {
        writeln!(f, "/* {title} */")?;
        for (name, field) in self.map.layout().fields().filter(|(n, _)| select(*n)) {
            write_define(f, name, field)?;
        }
        writeln!(f)
    }
}

fn write_define(f: &mut fmt::Formatter<'_>, name: FieldName, field: Bitfield) -> fmt::Result {
    writeln!(f, "#define {name}_HI {}ul", field.hi())?;
    writeln!(f, "#define {name}_LO {}ul", field.lo())
}

impl fmt::Display for CHeaderBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "/* This file is automatically generated by the address map generator */"
        )?;
        writeln!(f, "#ifndef {GUARD}")?;
        writeln!(f, "#define {GUARD}")?;
        writeln!(f)?;
        self.section(f, "Is absolute bit", |n| n == FieldName::IsAbsolute)?;
        self.section(f, "Absolute address bits", FieldName::is_absolute)?;
        self.section(f, "Relative address bits", FieldName::is_relative)?;
        writeln!(f, "#endif /* {GUARD} */")
    }
}
