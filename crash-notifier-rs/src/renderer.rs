//! Alert rendering
//!
//! Turns an enriched failure into a backend-neutral [`Notification`]. The
//! renderer is pure; every field is filled even when enrichment or log
//! retrieval came back empty.

use shared_types::record::region_from_arn;
use shared_types::{
    Attachment, BackendKind, DeepLink, EnrichedFailureRecord, Field, Notification, Partial, TaskDefinitionSummary,
};

use backend_sdk::util::safe_file_component;

const NOT_AVAILABLE: &str = "N/A";
const NO_LOGS: &str = "no logs retrieved";
const LOG_SEPARATOR: &str = "========================================";

pub struct AlertRenderer {
    environment: String,
}

impl AlertRenderer {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
        }
    }

    pub fn render(&self, enriched: &EnrichedFailureRecord) -> Notification {
        let record = &enriched.record;
        let service = record.service.as_deref().unwrap_or("standalone task");
        let exit_code = record
            .exit_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let category = record.stopped_reason.category;

        let mut fields = vec![
            Field::new("Cluster", &record.cluster),
            Field::new("Service", service),
            Field::new("Exit Code", &exit_code),
            Field::new("Stopped Reason", &record.stopped_reason.text),
            Field::new("Timestamp", record.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            Field::new("Task ID", &record.task_id),
        ];
        if record.service.is_some() {
            fields.push(Field::new("Service Health", enriched.health.describe()));
        }
        fields.extend([
            Field::new("Environment", &self.environment),
            Field::new("Container", record.container_name.as_deref().unwrap_or("unknown")),
            Field::new("Reason Category", category.label()),
            Field::new("Task Definition", task_definition_label(enriched)),
            Field::new("Image", image(&enriched.task_definition)),
            Field::new("CPU / Memory", resources(&enriched.task_definition)),
            Field::new("Log Source", log_source(enriched)),
        ]);

        let deep_link = match (enriched.logs.source(), enriched.logs.deep_link()) {
            (Some(source), Some(url)) => Some(DeepLink {
                label: deep_link_label(source).to_string(),
                url: url.to_string(),
            }),
            _ => None,
        };

        let region = record.region.as_deref().or_else(|| region_from_arn(&record.task_arn));
        let footer = match (region, record.service.as_deref()) {
            (Some(region), Some(service)) => vec![format!(
                "ECS console: {}",
                console_health_url(region, &record.cluster, service)
            )],
            _ => Vec::new(),
        };

        Notification {
            header: format!("🚨 Task Crash Detected: {} ({})", service, record.cluster),
            fallback_text: format!(
                "Task crash: {} in {} (exit code {}, {})",
                service, record.cluster, exit_code, category
            ),
            summary: Some(format!(
                "Task `{}` stopped in *{}*: {}",
                record.task_id, self.environment, record.stopped_reason.text
            )),
            fields,
            sections: Vec::new(),
            deep_link,
            attachment: Some(log_attachment(enriched)),
            footer,
        }
    }
}

fn task_definition_label(enriched: &EnrichedFailureRecord) -> String {
    match (&enriched.task_definition, enriched.record.task_definition_label()) {
        (Partial::Known(summary), _) => summary.label(),
        (Partial::Unknown { .. }, Some(label)) => label.to_string(),
        (Partial::Unknown { reason }, None) => format!("unknown ({})", reason),
    }
}

fn image(task_definition: &Partial<TaskDefinitionSummary>) -> String {
    match task_definition {
        Partial::Known(summary) => summary.image.clone().unwrap_or_else(|| "unknown".to_string()),
        Partial::Unknown { reason } => format!("unknown ({})", reason),
    }
}

fn resources(task_definition: &Partial<TaskDefinitionSummary>) -> String {
    match task_definition {
        Partial::Known(summary) => summary.resources(),
        Partial::Unknown { reason } => format!("unknown ({})", reason),
    }
}

fn log_source(enriched: &EnrichedFailureRecord) -> String {
    match enriched.logs.source() {
        Some(source) => match enriched.logs.lines().len() {
            1 => format!("{} (1 line)", source.display_name()),
            n => format!("{} ({} lines)", source.display_name(), n),
        },
        None => format!("none ({})", NO_LOGS),
    }
}

fn deep_link_label(source: BackendKind) -> &'static str {
    match source {
        BackendKind::Elasticsearch => "View logs in Kibana",
        BackendKind::Coralogix => "View logs in Coralogix",
        BackendKind::CloudWatch => "View logs in CloudWatch",
    }
}

fn console_health_url(region: &str, cluster: &str, service: &str) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/ecs/v2/clusters/{cluster}/services/{service}/health?region={region}",
        region = region,
        cluster = cluster,
        service = service
    )
}

fn log_attachment(enriched: &EnrichedFailureRecord) -> Attachment {
    let record = &enriched.record;
    let service = record.service.as_deref().unwrap_or_default();

    let content = match enriched.logs.source() {
        Some(source) => {
            let mut content = format!("LOG SOURCE: {}\n{}\n", source.as_str().to_uppercase(), LOG_SEPARATOR);
            for line in enriched.logs.lines() {
                content.push_str(&line.render());
                content.push('\n');
            }
            content
        }
        None => format!("{}\n", NO_LOGS),
    };

    Attachment {
        filename: format!(
            "{}_{}_logs.txt",
            safe_file_component(service),
            safe_file_component(&record.task_id)
        ),
        title: format!(
            "Crash logs for {} (Task: {})",
            record.service.as_deref().unwrap_or("standalone task"),
            record.task_id
        ),
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_record;
    use shared_types::{LogLine, LogQueryResult, ServiceHealth};

    fn enriched(logs: LogQueryResult, task_definition: Partial<TaskDefinitionSummary>) -> EnrichedFailureRecord {
        EnrichedFailureRecord {
            record: sample_record(),
            logs,
            health: ServiceHealth::unknown("AccessDeniedException"),
            task_definition,
        }
    }

    fn labels(notification: &Notification) -> Vec<&str> {
        notification.fields.iter().map(|f| f.label.as_str()).collect()
    }

    #[test]
    fn test_render_without_logs_keeps_every_field() {
        let notification = AlertRenderer::new("production").render(&enriched(
            LogQueryResult::not_found(),
            Partial::unknown("ClientException"),
        ));

        assert_eq!(notification.header, "🚨 Task Crash Detected: payments-api (prod)");
        assert_eq!(
            labels(&notification),
            vec![
                "Cluster",
                "Service",
                "Exit Code",
                "Stopped Reason",
                "Timestamp",
                "Task ID",
                "Service Health",
                "Environment",
                "Container",
                "Reason Category",
                "Task Definition",
                "Image",
                "CPU / Memory",
                "Log Source",
            ]
        );
        assert_eq!(notification.field("Exit Code"), Some("137"));
        assert_eq!(notification.field("Service Health"), Some("unknown (AccessDeniedException)"));
        assert_eq!(notification.field("Task Definition"), Some("payments-api:42"));
        assert_eq!(notification.field("Image"), Some("unknown (ClientException)"));
        assert_eq!(notification.field("Log Source"), Some("none (no logs retrieved)"));
        assert_eq!(notification.deep_link, None);

        let attachment = notification.attachment.unwrap();
        assert_eq!(attachment.filename, "payments-api_0f9a1b2c3d4e_logs.txt");
        assert_eq!(attachment.content, "no logs retrieved\n");
    }

    #[test]
    fn test_log_source_line_count() {
        let logs = LogQueryResult::found(
            BackendKind::CloudWatch,
            vec![LogLine::new(None, "a"), LogLine::new(None, "b"), LogLine::new(None, "c")],
            None,
        );
        let notification = AlertRenderer::new("production").render(&enriched(logs, Partial::unknown("x")));
        assert_eq!(notification.field("Log Source"), Some("CloudWatch (3 lines)"));
    }

    #[test]
    fn test_render_with_logs_and_deep_link() {
        let ts = "2024-03-01T11:59:58Z".parse().ok();
        let logs = LogQueryResult::found(
            BackendKind::Elasticsearch,
            vec![LogLine::new(ts, "fatal error: out of memory")],
            Some("https://kibana.example.com/app/discover#/".to_string()),
        );
        let summary = TaskDefinitionSummary {
            family: "payments-api".to_string(),
            revision: 42,
            cpu: Some("512".to_string()),
            memory: Some("1024".to_string()),
            image: Some("registry.example.com/payments-api:1.8.0".to_string()),
            ..TaskDefinitionSummary::default()
        };
        let notification = AlertRenderer::new("production").render(&enriched(logs, Partial::Known(summary)));

        assert_eq!(notification.field("CPU / Memory"), Some("512 CPU / 1024 MiB"));
        assert_eq!(notification.field("Log Source"), Some("Elasticsearch (1 line)"));
        let link = notification.deep_link.unwrap();
        assert_eq!(link.label, "View logs in Kibana");

        let attachment = notification.attachment.unwrap();
        assert_eq!(
            attachment.content,
            format!(
                "LOG SOURCE: ELASTICSEARCH\n{}\n[2024-03-01T11:59:58.000Z] fatal error: out of memory\n",
                LOG_SEPARATOR
            )
        );
        assert_eq!(attachment.title, "Crash logs for payments-api (Task: 0f9a1b2c3d4e)");
        assert_eq!(
            notification.footer,
            vec!["ECS console: https://us-east-1.console.aws.amazon.com/ecs/v2/clusters/prod/services/payments-api/health?region=us-east-1".to_string()]
        );
    }

    #[test]
    fn test_missing_exit_code_and_service() {
        let mut enriched = enriched(LogQueryResult::not_found(), Partial::unknown("lookup failed"));
        enriched.record.exit_code = None;
        enriched.record.service = None;

        let notification = AlertRenderer::new("staging").render(&enriched);

        assert_eq!(notification.field("Exit Code"), Some("N/A"));
        assert_eq!(notification.field("Service Health"), None);
        assert!(notification.footer.is_empty());
        assert_eq!(notification.attachment.unwrap().filename, "unknown_0f9a1b2c3d4e_logs.txt");
    }
}
