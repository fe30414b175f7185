use core::fmt;
use std::{fs, io, path::Path};

use anyhow::Context;
use compact_str::CompactString;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::{Map, Value};

use crate::util::write_atomically;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    /// Resume cursor: text of the newest message already exported.
    #[serde(default)]
    pub last_message: Option<String>,
    /// Whatever else the user keeps in the file survives a rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The contact list, in file order. Keys are exact display names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contacts {
    entries: Vec<(CompactString, ContactEntry)>,
}

impl Contacts {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open contact list {}", path.display()))?;
        let reader = io::BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Invalid contact list {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut json = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        json.push(b'\n');
        write_atomically(path, &json)
    }

    pub fn insert(&mut self, name: impl Into<CompactString>, entry: ContactEntry) {
        let name = name.into();
        if let Some(slot) = self.get_mut(&name) {
            *slot = entry;
        } else {
            self.entries.push((name, entry));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ContactEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ContactEntry> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn names(&self) -> impl Iterator<Item = &CompactString> {
        self.entries.iter().map(|(n, _)| n)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Contacts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Contacts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ContactsVisitor;

        impl<'de> Visitor<'de> for ContactsVisitor {
            type Value = Contacts;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping contact names to entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Contacts, A::Error> {
                let mut contacts = Contacts::default();
                while let Some((name, entry)) = access.next_entry::<CompactString, ContactEntry>()? {
                    contacts.insert(name, entry);
                }
                Ok(contacts)
            }
        }

        deserializer.deserialize_map(ContactsVisitor)
    }
}
