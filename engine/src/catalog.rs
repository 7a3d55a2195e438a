//! Process-wide catalog of standard resource classes and traits.
//!
//! Standard resource classes are known at compile time and carry dense
//! integer indices; custom classes (`CUSTOM_` prefix) are created in the
//! store and live in an id space offset by [`CUSTOM_RESOURCE_CLASS_ID_OFFSET`]
//! so the two can never collide. Standard trait names are synced into the
//! store at initialization and keep their ids forever after.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Prefix shared by dynamically created resource classes and traits.
pub const CUSTOM_PREFIX: &str = "CUSTOM_";

/// Custom resource class ids are `OFFSET + row id`.
pub const CUSTOM_RESOURCE_CLASS_ID_OFFSET: i32 = 10_000;

/// Marker trait: a provider bearing it shares its inventory with every
/// provider co-member of any of its aggregates.
pub const SHARES_VIA_AGGREGATE: &str = "MISC_SHARES_VIA_AGGREGATE";

/// Standard resource classes, in index order. The position in this slice
/// IS the class id.
pub const STANDARD_RESOURCE_CLASSES: &[&str] = &[
    "VCPU",
    "MEMORY_MB",
    "DISK_GB",
    "PCI_DEVICE",
    "SRIOV_NET_VF",
    "NUMA_SOCKET",
    "NUMA_CORE",
    "NUMA_THREAD",
    "NUMA_MEMORY_MB",
    "IPV4_ADDRESS",
];

/// Standard trait vocabulary. The full vocabulary is maintained in an
/// external catalog; this is the subset this deployment registers at
/// startup.
pub const STANDARD_TRAITS: &[&str] = &[
    SHARES_VIA_AGGREGATE,
    "HW_CPU_X86_AVX",
    "HW_CPU_X86_AVX2",
    "HW_CPU_X86_BMI",
    "HW_CPU_X86_SGX",
    "HW_CPU_X86_SSE",
    "HW_CPU_X86_SSE2",
    "HW_CPU_X86_SSE3",
    "HW_CPU_X86_TBM",
    "HW_CPU_X86_TSX",
    "HW_NIC_SRIOV",
    "STORAGE_DISK_HDD",
    "STORAGE_DISK_SSD",
];

lazy_static! {
    static ref STANDARD_CLASS_IDS: HashMap<&'static str, i32> = STANDARD_RESOURCE_CLASSES
        .iter()
        .enumerate()
        .map(|(index, name)| (*name, index as i32))
        .collect();
}

/// Dense index of a standard resource class name, if it is one.
pub fn standard_class_id(name: &str) -> Option<i32> {
    STANDARD_CLASS_IDS.get(name).copied()
}

/// Name of a standard resource class id, if it is one.
pub fn standard_class_name(id: i32) -> Option<&'static str> {
    usize::try_from(id)
        .ok()
        .and_then(|index| STANDARD_RESOURCE_CLASSES.get(index))
        .copied()
}

pub fn is_custom_name(name: &str) -> bool {
    name.starts_with(CUSTOM_PREFIX)
}

pub fn is_custom_class_id(id: i32) -> bool {
    id >= CUSTOM_RESOURCE_CLASS_ID_OFFSET
}
