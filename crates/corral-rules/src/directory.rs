//! Container directory seam
//!
//! The engine only ever passes container ids through; resolving an id to
//! something the host can route a tab into is the host's job. CSV
//! interchange and presets need the name<->id mapping, so they take this
//! trait instead of a concrete store.

/// Host-visible facts about one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    /// Reserved category marker, e.g. "preset:banking", used to recognize
    /// a container created for a preset even after the user renamed it.
    pub marker: Option<String>,
}

/// Name<->id resolution for whatever container store the host runs.
pub trait ContainerDirectory {
    fn by_id(&self, id: &str) -> Option<ContainerInfo>;
    fn by_name(&self, name: &str) -> Option<ContainerInfo>;
    fn all(&self) -> Vec<ContainerInfo>;
}

/// Fixed in-memory directory for tests and the CLI.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    containers: Vec<ContainerInfo>,
}

impl StaticDirectory {
    pub fn new(containers: Vec<ContainerInfo>) -> Self {
        Self { containers }
    }

    pub fn add(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.containers.push(ContainerInfo {
            id: id.into(),
            name: name.into(),
            marker: None,
        });
    }

    pub fn add_with_marker(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        marker: impl Into<String>,
    ) {
        self.containers.push(ContainerInfo {
            id: id.into(),
            name: name.into(),
            marker: Some(marker.into()),
        });
    }
}

impl ContainerDirectory for StaticDirectory {
    fn by_id(&self, id: &str) -> Option<ContainerInfo> {
        self.containers.iter().find(|c| c.id == id).cloned()
    }

    fn by_name(&self, name: &str) -> Option<ContainerInfo> {
        self.containers
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn all(&self) -> Vec<ContainerInfo> {
        self.containers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut dir = StaticDirectory::default();
        dir.add("c1", "Work");
        assert_eq!(dir.by_id("c1").unwrap().name, "Work");
        assert_eq!(dir.by_name("work").unwrap().id, "c1");
        assert!(dir.by_name("missing").is_none());
    }
}
