use anyhow::Result;

use super::{build_manager, report, GlobalOpts, TestKind};

pub(crate) fn run_test(
    global: &GlobalOpts,
    device: &str,
    kind: TestKind,
    target: Option<&str>,
) -> Result<()> {
    let manager = build_manager(global);
    let result = match kind {
        TestKind::Connection => manager.test_connection(device, target),
        TestKind::Hosts => manager.test_hosts_redirection(device, target),
        TestKind::Dns => manager.test_dns_redirection(device, target),
    };
    report(result)
}
