//! Special-object holder statistics.

use std::io::{self, Write};

use crate::collectors::dict_size::{is_dictionary_type, live_entry_count};
use crate::collectors::{CollectorKind, StatCollector};
use crate::heap::HeapObject;
use crate::histogram::{Histogram, DEFAULT_KEY_WIDTH, DEFAULT_TOP_COUNT};

const BYTE_ARRAY_TYPE: &str = "System.Byte[]";

/// Finds which types hold "special" objects through their fields.
///
/// Unlike the other collectors this one has no type-name filter: every
/// object's declared object-reference fields are walked. A field whose
/// target is a byte array counts the *containing* type in one histogram;
/// a field whose target is a dictionary with zero live entries counts it
/// in the other. A field contributes to at most one category, an object
/// contributes once per qualifying field.
#[derive(Debug, Default)]
pub struct SpecialHolderCollector {
    byte_array_holders: Histogram<String>,
    empty_dict_holders: Histogram<String>,
}

impl SpecialHolderCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: SpecialHolderCollector) {
        self.byte_array_holders.merge(other.byte_array_holders);
        self.empty_dict_holders.merge(other.empty_dict_holders);
    }

    pub fn byte_array_holders(&self) -> &Histogram<String> {
        &self.byte_array_holders
    }

    pub fn empty_dict_holders(&self) -> &Histogram<String> {
        &self.empty_dict_holders
    }
}

impl StatCollector for SpecialHolderCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::SpecialHolder
    }

    fn display_name(&self) -> &'static str {
        "Special Object Holder Stats"
    }

    fn process_object(&mut self, type_name: &str, obj: &dyn HeapObject) {
        for field in obj.reference_fields() {
            let Some(target) = obj.read_object_field(&field) else {
                continue;
            };
            let Some(target_type) = target.type_name() else {
                continue;
            };
            if target_type.is_empty() {
                continue;
            }

            if target_type == BYTE_ARRAY_TYPE {
                self.byte_array_holders.add(type_name.to_string());
            } else if is_dictionary_type(&target_type) && live_entry_count(&*target) == Some(0) {
                self.empty_dict_holders.add(type_name.to_string());
            }
        }
    }

    fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "Distinct types holding empty dictionaries: {}",
            self.empty_dict_holders.distinct()
        )?;
        writeln!(out, "Histogram of types holding empty dictionaries:")?;
        self.empty_dict_holders
            .write_report(out, DEFAULT_TOP_COUNT, DEFAULT_KEY_WIDTH)?;
        writeln!(out)?;
        writeln!(
            out,
            "Distinct types holding byte arrays: {}",
            self.byte_array_holders.distinct()
        )?;
        writeln!(out, "Histogram of types holding byte arrays:")?;
        self.byte_array_holders
            .write_report(out, DEFAULT_TOP_COUNT, DEFAULT_KEY_WIDTH)
    }
}
