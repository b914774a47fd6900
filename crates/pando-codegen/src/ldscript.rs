//! Linker script for PANDO firmware.
//!
//! Programs are linked against the relative windows so that one binary runs
//! on every core: each core's accesses land in its own L1SP, its pod's L2SP,
//! and its PXN's DRAM. DRAM is split into a fixed text region followed by a
//! data region holding everything else.

use std::fmt::Write;

use pando_addrmap::{AddressInfo, AddressMap};

use crate::error::Result;

/// Bytes reserved for `.text` at the bottom of the DRAM window.
pub const DRAM_TEXT_SIZE: u64 = 8 * 1024 * 1024;

const SECTION_ALIGN: u32 = 16;

/// An output section and the input section patterns it collects.
struct OutputSection {
    name: &'static str,
    inputs: &'static [&'static str],
    region: &'static str,
}

const SECTIONS: &[OutputSection] = &[
    OutputSection {
        name: ".l1sp",
        inputs: &[".l1sp.interrupt", ".l1sp", ".l1sp.*"],
        region: "L1SP_VMA",
    },
    OutputSection {
        name: ".l2sp",
        inputs: &[".l2sp.interrupt", ".l2sp", ".l2sp.*"],
        region: "L2SP_VMA",
    },
    OutputSection {
        name: ".text.dram",
        inputs: &[
            ".text.interrupt",
            ".crtbegin",
            ".text",
            ".text.startup",
            ".text.*",
        ],
        region: "DRAM_T_VMA",
    },
    OutputSection {
        name: ".eh_frame.dram",
        inputs: &[".eh_frame", ".eh_frame*"],
        region: "DRAM_D_VMA",
    },
    OutputSection {
        name: ".rodata.dram",
        inputs: &[
            ".rodata",
            ".rodata.*",
            ".srodata.cst16",
            ".srodata.cst8",
            ".srodata.cst4",
            ".srodata.cst2",
            ".srodata",
        ],
        region: "DRAM_D_VMA",
    },
    OutputSection {
        name: ".data.dram",
        inputs: &[".dram", ".dram.*", ".data", ".data*"],
        region: "DRAM_D_VMA",
    },
    OutputSection {
        name: ".sdata.dram",
        inputs: &[
            ".sdata",
            ".sdata.*",
            ".sdata*",
            ".sdata*.gnu.linkonce.s.*",
            ".sbss",
            ".sbss*",
            ".gnu.linkonce.sb.*",
            ".scommon",
        ],
        region: "DRAM_D_VMA",
    },
    OutputSection {
        name: ".bss.dram",
        inputs: &[".bss", ".bss*"],
        region: "DRAM_D_VMA",
    },
];

/// A `MEMORY` region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub name: &'static str,
    pub attributes: &'static str,
    pub origin: u64,
    pub length: u64,
}

/// Renders the firmware linker script.
#[derive(Debug, Clone, Copy)]
pub struct LdScriptBuilder<'a> {
    map: &'a AddressMap,
}

impl<'a> LdScriptBuilder<'a> {
    pub fn new(map: &'a AddressMap) -> Self {
        Self { map }
    }

    fn window(&self, base: AddressInfo) -> Result<(u64, u64)> {
        let origin = self.map.encode(base)?;
        let length = self.map.layout().window_size(base.kind(), base.mode())?;
        Ok((origin, length))
    }

    /// The four regions of the `MEMORY` block, in order.
    ///
    /// # Errors
    ///
    /// Propagates encoding errors for the relative base addresses.
    pub fn regions(&self) -> Result<[MemoryRegion; 4]> {
        let (l1sp, l1sp_size) = self.window(AddressInfo::relative_l1sp_base())?;
        let (l2sp, l2sp_size) = self.window(AddressInfo::relative_l2sp_base())?;
        let (dram, dram_size) = self.window(AddressInfo::relative_dram_base())?;
        Ok([
            MemoryRegion {
                name: "L1SP_VMA",
                attributes: "rw",
                origin: l1sp,
                length: l1sp_size,
            },
            MemoryRegion {
                name: "L2SP_VMA",
                attributes: "rw",
                origin: l2sp,
                length: l2sp_size,
            },
            MemoryRegion {
                name: "DRAM_T_VMA",
                attributes: "rwx",
                origin: dram,
                length: DRAM_TEXT_SIZE,
            },
            MemoryRegion {
                name: "DRAM_D_VMA",
                attributes: "rwx",
                origin: dram + DRAM_TEXT_SIZE,
                length: dram_size - DRAM_TEXT_SIZE,
            },
        ])
    }

    /// The complete linker script.
    ///
    /// # Errors
    ///
    /// Propagates encoding errors for the relative base addresses.
    pub fn build(&self) -> Result<String> {
        let regions = self.regions()?;
        let mut out = String::new();

        writeln!(out, "MEMORY")?;
        writeln!(out, "{{")?;
        for region in &regions {
            let head = format!("{} ({})", region.name, region.attributes);
            writeln!(
                out,
                "{head:<16} : ORIGIN = 0x{:08x}, LENGTH = 0x{:08x}",
                region.origin, region.length
            )?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "SECTIONS")?;
        writeln!(out, "{{")?;
        for section in SECTIONS {
            writeln!(out, "{} :", section.name)?;
            writeln!(out, "{{")?;
            for input in section.inputs {
                writeln!(out, "*({input})")?;
            }
            writeln!(out, ". = ALIGN({SECTION_ALIGN});")?;
            writeln!(out, "}} > {}", section.region)?;
            writeln!(out)?;
        }
        writeln!(out, "__global_pointer$ = 0x{:08x};", regions[2].origin)?;
        writeln!(out, "_end = .;")?;
        writeln!(out, "end = .;")?;
        writeln!(out, "_edata = .;")?;
        writeln!(out, "ENTRY(_start)")?;
        writeln!(out, "}}")?;

        log::debug!("rendered linker script ({} bytes)", out.len());
        Ok(out)
    }
}
