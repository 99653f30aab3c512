use once_cell::sync::Lazy;
use regex::Regex;

pub const TOPIC_ROOT: &str = "radiolog";

// Node firmware publishes with a leading '/', controllers without.
static NODE_TOPIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/?radiolog/([^/#+]+)/(.+)$").unwrap());

/// Fully qualified topic for `suffix` under the node's namespace.
pub fn build_topic(node_id: &str, suffix: &str) -> String {
    format!("{}/{}/{}", TOPIC_ROOT, node_id, suffix.trim_matches('/'))
}

/// Wildcard filter matching everything a node publishes or receives.
pub fn listen_filter(node_id: &str) -> String {
    format!("{}/{}/#", TOPIC_ROOT, node_id)
}

/// Same as [`listen_filter`] for the node's own reports, which the firmware
/// publishes under `/radiolog/...` (an empty first level in MQTT).
pub fn firmware_filter(node_id: &str) -> String {
    format!("/{}", listen_filter(node_id))
}

/// Splits `radiolog/<node>/<suffix>` into `(node, suffix)`.
pub fn split_node_topic(topic: &str) -> Option<(String, String)> {
    NODE_TOPIC_RE
        .captures(topic)
        .and_then(|caps| Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_topic() {
        assert_eq!(build_topic("Node_85d904", "reset"), "radiolog/Node_85d904/reset");
        assert_eq!(build_topic("Node_85d904", "cover/set"), "radiolog/Node_85d904/cover/set");
        assert_eq!(build_topic("Node_513b66", "/cfg/write/"), "radiolog/Node_513b66/cfg/write");
    }

    #[test]
    fn test_listen_filter() {
        assert_eq!(listen_filter("Node_f4a98f"), "radiolog/Node_f4a98f/#");
        assert_eq!(firmware_filter("Node_f4a98f"), "/radiolog/Node_f4a98f/#");
    }

    #[test]
    fn test_filters_cover_both_namespaces() {
        let node = "Node_85d904";
        let controller = build_topic(node, "cfg/read");
        let firmware = format!("/{}", build_topic(node, "announce"));

        // Matching by level: '#' takes the rest, every other level must be equal.
        let matched = |filter: &str, topic: &str| {
            let levels: Vec<&str> = filter.split('/').collect();
            let (prefix, rest) = levels.split_at(levels.len() - 1);
            assert_eq!(rest, ["#"]);
            let topic: Vec<&str> = topic.split('/').collect();
            topic.len() > prefix.len() && topic[..prefix.len()] == *prefix
        };

        assert!(matched(&listen_filter(node), &controller));
        assert!(!matched(&listen_filter(node), &firmware));
        assert!(matched(&firmware_filter(node), &firmware));
        assert!(!matched(&firmware_filter(node), &controller));
        assert_eq!(split_node_topic(&firmware).map(|(n, _)| n).as_deref(), Some(node));
    }

    #[test]
    fn test_build_topic_contains_only_its_node() {
        let nodes = ["Node_85d904", "Node_f4a98f", "Node_513b66"];
        for (i, node) in nodes.iter().enumerate() {
            let topic = build_topic(node, "cover/set/position");
            assert!(topic.contains(node));
            for (j, other) in nodes.iter().enumerate() {
                if i != j {
                    assert!(!topic.contains(other), "{} leaked into {}", other, topic);
                }
            }
        }
    }

    #[test]
    fn test_split_node_topic() {
        assert_eq!(
            split_node_topic("radiolog/Node_85d904/cfg/read"),
            Some(("Node_85d904".to_string(), "cfg/read".to_string()))
        );
        assert_eq!(
            split_node_topic("/radiolog/Node_85d904/status"),
            Some(("Node_85d904".to_string(), "status".to_string()))
        );
        assert_eq!(split_node_topic("radiolog/Node_85d904"), None);
        assert_eq!(split_node_topic("caller/abc/status"), None);
    }
}
