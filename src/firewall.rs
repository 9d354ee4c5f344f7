//! Optional ufw hardening

use crate::orchestrator::RunContext;
use crate::runner::{CommandRunner, shell_quote};

/// Open admin and web ports if ufw is present; returns whether ufw got enabled
pub fn configure(ctx: &RunContext<'_>, runner: &CommandRunner<'_>) -> bool {
    let reporter = runner.reporter();

    if !runner.probe("ufw status", "Check UFW").succeeded {
        reporter.warn("UFW is not installed, skipping firewall setup");
        return false;
    }

    let rules = &ctx.config.firewall;
    runner.run(
        &format!("ufw allow {}", shell_quote(&rules.admin_rule)),
        &format!("Allow {}", rules.admin_rule),
    );
    runner.run(
        &format!("ufw allow {}", shell_quote(&rules.proxy_profile)),
        &format!("Allow {}", rules.proxy_profile),
    );
    let enabled = runner.run("ufw --force enable", "Enable UFW").succeeded;

    if enabled {
        reporter.success("Firewall configured");
    }
    enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisionConfig;
    use crate::preflight::OsFamily;
    use crate::ui::{Level, Transcript};
    use shellrun::{CommandOutput, Recorder};

    #[test]
    fn test_absent_ufw_is_a_warning() {
        let config = ProvisionConfig::default();
        let ctx = RunContext::for_tests(&config, OsFamily::Debian);
        let rec = Recorder::new().respond("ufw status", CommandOutput::failure(127, "ufw: not found"));
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        assert!(!configure(&ctx, &runner));
        assert_eq!(rec.scripts(), vec!["ufw status"]);
        assert_eq!(t.count(Level::Warn), 1);
        assert_eq!(t.count(Level::Error), 0);
    }

    #[test]
    fn test_present_ufw_opens_ports_then_enables() {
        let config = ProvisionConfig::default();
        let ctx = RunContext::for_tests(&config, OsFamily::Debian);
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        assert!(configure(&ctx, &runner));
        assert_eq!(
            rec.scripts(),
            vec![
                "ufw status",
                "ufw allow 'ssh'",
                "ufw allow 'Nginx Full'",
                "ufw --force enable",
            ]
        );
    }
}
