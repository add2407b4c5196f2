//! Deterministic narratives used when the model cannot be reached.

use vpcwatch_core::{Anomaly, AnomalyType};

/// A canned explanation for `anomaly`, one arm per type. Never empty.
pub fn fallback_narrative(anomaly: &Anomaly) -> String {
    let count = anomaly.instance_count();

    match anomaly.kind() {
        AnomalyType::PortScanning => format!(
            "BASIC ANALYSIS - PORT SCANNING

Technical explanation:
Systematic probing of many destination ports was detected, which usually
indicates network reconnaissance ahead of an attack.
Instances detected: {count}

Severity: 8/10 - high risk of an imminent attack

Immediate actions:
1. Block the offending source IPs in security groups / NACLs
2. Review firewall and WAF logs for correlated activity
3. Rate-limit exposed services

Prevention:
- Enable AWS WAF or fail2ban-style automatic blocking
- Close or hide non-essential services
- Deploy honeypots for early detection"
        ),
        AnomalyType::DDoS => format!(
            "BASIC ANALYSIS - DDOS ATTACK

Technical explanation:
A distributed denial-of-service pattern was detected: very high packet
volume or an unusually large number of distinct sources hitting one target.
Instances detected: {count}

Severity: 9/10 - critical, service availability is at risk

Immediate actions:
1. Engage AWS Shield Advanced
2. Apply rate limiting on the load balancer / WAF
3. Review auto-scaling limits and health checks

Prevention:
- Front public endpoints with CloudFront
- Apply geo-blocking where it fits the audience
- Alarm on abnormal traffic volume"
        ),
        AnomalyType::DataExfiltration => format!(
            "BASIC ANALYSIS - DATA EXFILTRATION

Technical explanation:
Unusually large outbound transfers were detected between specific
source/destination pairs over common egress ports.
Instances detected: {count}

Severity: 8/10 - high risk of data compromise

Immediate actions:
1. Investigate the identified connections and their owners
2. Review access logs of critical applications
3. Verify the integrity of sensitive data stores

Prevention:
- Deploy data loss prevention (DLP) controls
- Monitor and alarm on large transfers
- Enforce multi-factor authentication"
        ),
        AnomalyType::UnusualProtocol => generic_narrative(anomaly.kind(), count),
    }
}

fn generic_narrative(kind: AnomalyType, count: usize) -> String {
    format!(
        "BASIC ANALYSIS - {}

Anomaly detected with {count} instance(s).
Immediate manual investigation is required.",
        kind.display_name().to_uppercase()
    )
}
