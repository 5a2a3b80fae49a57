//! Task Scheduler XML: rendering a [`TaskDefinition`] and reading back the
//! fields that decide whether an installed task still matches.

use crate::error::{Error, Result};
use crate::types::{
    InstalledTask, NETWORK_PROFILE_PROVIDER, Principal, RunLevel, SYSTEM_SID, TaskDefinition,
    Trigger,
};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

const TASK_NAMESPACE: &str = "http://schemas.microsoft.com/windows/2004/02/mit/task";

static TRIGGERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Triggers>(.*?)</Triggers>").expect("valid regex"));
static TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(LogonTrigger|BootTrigger|EventTrigger|\w+Trigger)\b[^>]*>(.*?)</\w+Trigger>")
        .expect("valid regex")
});
static EVENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"EventID\s*=\s*(\d+)").expect("valid regex"));
static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Path\s*=\s*['"]([^'"]+)['"]"#).expect("valid regex"));
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid regex")
});

/// Render a definition as Task Scheduler XML (schema 1.2).
pub fn render(def: &TaskDefinition) -> String {
    let trigger = match &def.trigger {
        Trigger::Logon { delay } => format!(
            "    <LogonTrigger>\n      <Enabled>true</Enabled>\n      <Delay>{}</Delay>\n    </LogonTrigger>\n",
            format_duration(*delay)
        ),
        Trigger::Boot { delay } => format!(
            "    <BootTrigger>\n      <Enabled>true</Enabled>\n      <Delay>{}</Delay>\n    </BootTrigger>\n",
            format_duration(*delay)
        ),
        Trigger::NetworkChange { channel, event_ids } => format!(
            "    <EventTrigger>\n      <Enabled>true</Enabled>\n      <Subscription>{}</Subscription>\n    </EventTrigger>\n",
            escape(&subscription(channel, event_ids))
        ),
    };

    let principal = match &def.principal {
        Principal::InteractiveUser => "      <LogonType>InteractiveToken</LogonType>\n".to_string(),
        Principal::System => format!("      <UserId>{SYSTEM_SID}</UserId>\n"),
        Principal::Group(name) => {
            format!("      <GroupId>{}</GroupId>\n", escape(&Principal::group_id(name)))
        }
    };

    let arguments = if def.arguments.is_empty() {
        String::new()
    } else {
        format!("      <Arguments>{}</Arguments>\n", escape(&def.arguments))
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-16"?>
<Task version="1.2" xmlns="{TASK_NAMESPACE}">
  <RegistrationInfo>
    <Description>{description}</Description>
  </RegistrationInfo>
  <Triggers>
{trigger}  </Triggers>
  <Principals>
    <Principal id="Author">
{principal}      <RunLevel>{run_level}</RunLevel>
    </Principal>
  </Principals>
  <Settings>
    <MultipleInstancesPolicy>IgnoreNew</MultipleInstancesPolicy>
    <DisallowStartIfOnBatteries>false</DisallowStartIfOnBatteries>
    <StopIfGoingOnBatteries>false</StopIfGoingOnBatteries>
    <StartWhenAvailable>true</StartWhenAvailable>
    <ExecutionTimeLimit>PT1H</ExecutionTimeLimit>
    <Enabled>true</Enabled>
  </Settings>
  <Actions Context="Author">
    <Exec>
      <Command>{command}</Command>
{arguments}    </Exec>
  </Actions>
</Task>
"#,
        description = escape(&def.description()),
        run_level = def.run_level.xml_value(),
        command = escape(&def.command),
    )
}

/// Event log query selecting `event_ids` from the network profile provider.
pub fn subscription(channel: &str, event_ids: &[u32]) -> String {
    let ids: Vec<String> = event_ids.iter().map(|id| format!("EventID={id}")).collect();
    format!(
        "<QueryList><Query Id=\"0\" Path=\"{channel}\"><Select Path=\"{channel}\">\
         *[System[Provider[@Name='{NETWORK_PROFILE_PROVIDER}'] and ({})]]\
         </Select></Query></QueryList>",
        ids.join(" or ")
    )
}

/// Read the managed fields of an installed task from its XML.
///
/// A task whose action is not `<Exec>` (a COM handler, say) parses with no
/// command, so it shows up as drift and gets replaced.
pub fn parse(name: &str, xml: &str) -> Result<InstalledTask> {
    if !xml.contains("<Task") {
        return Err(Error::Parse {
            name: name.to_string(),
            message: "no <Task> element".to_string(),
        });
    }

    let command = element(xml, "Command").map(|c| unescape(&c));
    let arguments = element(xml, "Arguments")
        .map(|a| unescape(&a))
        .unwrap_or_default();

    let run_level = match element(xml, "RunLevel").as_deref() {
        Some("HighestAvailable") => RunLevel::Highest,
        _ => RunLevel::Limited,
    };

    Ok(InstalledTask {
        name: name.to_string(),
        trigger: parse_trigger(xml),
        command,
        arguments,
        principal: parse_principal(xml),
        run_level,
    })
}

/// The single trigger of a task, if it is one this crate creates.
fn parse_trigger(xml: &str) -> Option<Trigger> {
    let block = TRIGGERS_RE.captures(xml)?.get(1)?.as_str();
    let mut triggers = TRIGGER_RE.captures_iter(block);
    let first = triggers.next()?;
    if triggers.next().is_some() {
        return None;
    }

    let body = first.get(2)?.as_str();
    let delay = || {
        element(body, "Delay")
            .and_then(|d| parse_duration(&d))
            .unwrap_or(Duration::ZERO)
    };

    match first.get(1)?.as_str() {
        "LogonTrigger" => Some(Trigger::Logon { delay: delay() }),
        "BootTrigger" => Some(Trigger::Boot { delay: delay() }),
        "EventTrigger" => {
            let query = unescape(&element(body, "Subscription")?);
            let channel = PATH_RE.captures(&query)?.get(1)?.as_str().to_string();
            let event_ids = EVENT_ID_RE
                .captures_iter(&query)
                .filter_map(|c| c.get(1)?.as_str().parse().ok())
                .collect();
            Some(Trigger::NetworkChange { channel, event_ids })
        }
        _ => None,
    }
}

fn parse_principal(xml: &str) -> Option<Principal> {
    if let Some(group) = element(xml, "GroupId") {
        return Some(Principal::Group(Principal::group_name(&unescape(&group))));
    }
    if let Some(user) = element(xml, "UserId") {
        let user = unescape(&user);
        if user.eq_ignore_ascii_case(SYSTEM_SID)
            || user.eq_ignore_ascii_case("SYSTEM")
            || user.eq_ignore_ascii_case(r"NT AUTHORITY\SYSTEM")
        {
            return Some(Principal::System);
        }
    }
    match element(xml, "LogonType").as_deref() {
        Some("InteractiveToken") => Some(Principal::InteractiveUser),
        _ => None,
    }
}

/// Text content of the first `<tag>` element.
fn element(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(xml[start..end].trim().to_string())
}

fn format_duration(d: Duration) -> String {
    format!("PT{}S", d.as_secs())
}

fn parse_duration(s: &str) -> Option<Duration> {
    let caps = DURATION_RE.captures(s.trim())?;
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(Duration::from_secs(part(1) * 3600 + part(2) * 60 + part(3)))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
