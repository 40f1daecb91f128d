/// How the directories a phase needs are made visible in a new container.
///
/// A directory is either bind-mounted at the same path or reached through the
/// mounts of a container listed in `volumes_from`, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumePlan {
    pub bind_mounts: Vec<(String, String)>,
    pub volumes_from: Vec<String>,
}

impl VolumePlan {
    fn bind(&mut self, dir: &str) {
        if !self.bind_mounts.iter().any(|(host, _)| host == dir) {
            self.bind_mounts.push((dir.to_string(), dir.to_string()));
        }
    }

    fn reuse(&mut self, container: &str) {
        if !self.volumes_from.iter().any(|id| id == container) {
            self.volumes_from.push(container.to_string());
        }
    }
}

/// Decides, per required directory, whether the container this process runs
/// in already exposes it through one of its mounts.
///
/// Coverage is a plain string-prefix test, so `/workspace2` counts as covered
/// by a mount at `/workspace`. The first matching mount wins. A directory no
/// mount covers is bind-mounted.
pub fn plan(required: &[String], self_container: Option<&str>, mounted: &[String]) -> VolumePlan {
    let mut plan = VolumePlan::default();
    let Some(container) = self_container else {
        for dir in required {
            plan.bind(dir);
        }
        return plan;
    };

    for dir in required {
        match mounted.iter().find(|volume| dir.starts_with(volume.as_str())) {
            Some(_) => plan.reuse(container),
            None => plan.bind(dir),
        }
    }
    plan
}
