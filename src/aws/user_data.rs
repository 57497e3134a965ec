/// ECS agent bootstrap script for container instances
use base64::{engine::general_purpose::STANDARD, Engine as _};
use handlebars::Handlebars;
use serde::Serialize;

use crate::error::Result;

const ECS_AGENT_TEMPLATE: &str = r#"#!/bin/bash
echo ECS_LOGLEVEL=debug >> /etc/ecs/ecs.config
echo ECS_ENABLE_TASK_IAM_ROLE=true >> /etc/ecs/ecs.config
echo ECS_CLUSTER={{cluster}} >> /etc/ecs/ecs.config
echo ECS_ENABLE_CONTAINER_METADATA=true >> /etc/ecs/ecs.config
echo ECS_ENABLE_AWSLOGS_EXECUTIONROLE_OVERRIDE=true >> /etc/ecs/ecs.config
echo ECS_AVAILABLE_LOGGING_DRIVERS=[\"awslogs\",\"fluentd\",\"json-file\",\"awsfirelens\"] >> /etc/ecs/ecs.config
"#;

#[derive(Serialize)]
struct TemplateValues<'a> {
    cluster: &'a str,
}

/// Render the bootstrap script that joins an instance to `cluster`
pub fn render(cluster: &str) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    Ok(handlebars.render_template(ECS_AGENT_TEMPLATE, &TemplateValues { cluster })?)
}

/// Rendered script, base64-encoded for the launch template
pub fn encoded(cluster: &str) -> Result<String> {
    Ok(STANDARD.encode(render(cluster)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_names_cluster() {
        let script = render("clustera").unwrap();
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("echo ECS_CLUSTER=clustera >> /etc/ecs/ecs.config"));
        assert!(script.contains(r#"[\"awslogs\",\"fluentd\",\"json-file\",\"awsfirelens\"]"#));
        // every setting lands in the agent config
        assert_eq!(script.matches("/etc/ecs/ecs.config").count(), 6);
    }

    #[test]
    fn test_encoded_roundtrip() {
        let encoded = encoded("clusterb").unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded, render("clusterb").unwrap());
    }
}
