/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "jobs",
    aliases: &["j", "job", "careers"],
    description: "Job postings",
  },
  Command {
    name: "applications",
    aliases: &["a", "apps", "applicants"],
    description: "Job applications",
  },
  Command {
    name: "employees",
    aliases: &["emp", "staff"],
    description: "Employee directory",
  },
  Command {
    name: "users",
    aliases: &["u", "user"],
    description: "Registered users",
  },
  Command {
    name: "products",
    aliases: &["p", "product", "shop"],
    description: "Store products",
  },
  Command {
    name: "enquiries",
    aliases: &["enq", "workshops"],
    description: "Workshop enquiries",
  },
  Command {
    name: "calls",
    aliases: &["c", "call-requests", "callbacks"],
    description: "Call requests",
  },
  Command {
    name: "assessments",
    aliases: &["as", "reports"],
    description: "Assessment reports",
  },
  Command {
    name: "raw",
    aliases: &["get"],
    description: "Any endpoint as a table (raw <path>)",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit madmin",
  },
];

/// Exact lookup by name or alias
pub fn find(input: &str) -> Option<&'static Command> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input || cmd.aliases.contains(&input.as_str()))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  // Only the command word is matched; the rest are arguments
  let input_lower = input
    .split_whitespace()
    .next()
    .unwrap_or_default()
    .to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_priority(cmd, &input_lower).map(|p| (cmd, p)))
    .collect();

  // Stable, so equal priorities keep declaration order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

fn match_priority(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("products");
    assert_eq!(suggestions[0].name, "products");
  }

  #[test]
  fn test_alias_match() {
    assert_eq!(get_suggestions("c")[0].name, "calls");
    assert_eq!(get_suggestions("emp")[0].name, "employees");
  }

  #[test]
  fn test_prefix_match() {
    assert_eq!(get_suggestions("appl")[0].name, "applications");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("quir");
    assert_eq!(suggestions[0].name, "enquiries");
  }

  #[test]
  fn test_arguments_do_not_affect_suggestions() {
    assert_eq!(get_suggestions("raw /orders?status=open")[0].name, "raw");
    assert_eq!(get_suggestions("get /orders")[0].name, "raw");
  }

  #[test]
  fn test_find_is_exact() {
    assert_eq!(find("Jobs").map(|c| c.name), Some("jobs"));
    assert_eq!(find("staff").map(|c| c.name), Some("employees"));
    assert!(find("job postings").is_none());
  }

  #[test]
  fn test_aliases_are_unique() {
    let mut seen = std::collections::HashSet::new();
    for cmd in COMMANDS {
      assert!(seen.insert(cmd.name), "duplicate {}", cmd.name);
      for alias in cmd.aliases {
        assert!(seen.insert(alias), "duplicate {}", alias);
      }
    }
  }
}
