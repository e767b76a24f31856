//! Status comment text

use moropo_core::domain::test_run::TestRunInfo;

/// Comment shown while the build uploads
pub const UPLOADING_BUILD: &str = "Uploading Build..";

/// Comment shown while the test run is being triggered
pub const TRIGGERING_TEST: &str = "Triggering test...";

/// Comment posted when the action will not report the run's result
pub const NO_FURTHER_UPDATES: &str =
    "Unable to update check status any further, please include a Github PAT or sync argument";

/// Markdown summary of a triggered test run
pub fn build_message_string(info: &TestRunInfo) -> String {
    let build = info.build_id.as_deref().unwrap_or("N/A");
    let channel = info.expo_release_channel.as_deref().unwrap_or("N/A");

    format!(
        "
## Moropo Test Run

### Summary

**Build:** {build}

**Release Channel:** {channel}

| **Device(s):**       | **Test(s):**        |
| -------------------- | ------------------- |
| {devices} | {tests} |

[View Results]({url})
",
        devices = info.devices.join("<br>"),
        tests = info.tests.join("<br>"),
        url = info.url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use moropo_core::domain::test_run::RunId;

    #[test]
    fn test_summary_message() {
        let info = TestRunInfo {
            id: RunId(1),
            build_id: Some("88".to_string()),
            devices: vec!["Pixel 7".to_string(), "iPhone 15".to_string()],
            tests: vec!["login".to_string()],
            expo_release_channel: Some("staging".to_string()),
            url: "https://app.moropo.com/runs/1".to_string(),
        };

        let message = build_message_string(&info);
        assert!(message.contains("## Moropo Test Run"));
        assert!(message.contains("**Build:** 88"));
        assert!(message.contains("**Release Channel:** staging"));
        assert!(message.contains("| Pixel 7<br>iPhone 15 | login |"));
        assert!(message.contains("[View Results](https://app.moropo.com/runs/1)"));
    }

    #[test]
    fn test_summary_without_build_or_channel() {
        let info = TestRunInfo {
            id: RunId(2),
            build_id: None,
            devices: Vec::new(),
            tests: Vec::new(),
            expo_release_channel: None,
            url: String::new(),
        };

        let message = build_message_string(&info);
        assert!(message.contains("**Build:** N/A"));
        assert!(message.contains("**Release Channel:** N/A"));
    }
}
