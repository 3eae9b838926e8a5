//! `:` commands and their autocomplete.

use crate::ui::views::Screen;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub action: CommandAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
  Open(Screen),
  Logout,
  Quit,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home", "inicio"],
    description: "Visão geral da academia",
    action: CommandAction::Open(Screen::Dashboard),
  },
  Command {
    name: "students",
    aliases: &["s", "alunos"],
    description: "Alunos",
    action: CommandAction::Open(Screen::Students),
  },
  Command {
    name: "instructors",
    aliases: &["i", "instrutores"],
    description: "Instrutores",
    action: CommandAction::Open(Screen::Instructors),
  },
  Command {
    name: "schedule",
    aliases: &["a", "agenda", "appointments"],
    description: "Agendamentos",
    action: CommandAction::Open(Screen::Schedule),
  },
  Command {
    name: "payments",
    aliases: &["p", "pagamentos"],
    description: "Pagamentos",
    action: CommandAction::Open(Screen::Payments),
  },
  Command {
    name: "progress",
    aliases: &["e", "evolucao"],
    description: "Registros de evolução",
    action: CommandAction::Open(Screen::Progress),
  },
  Command {
    name: "plans",
    aliases: &["t", "treinos", "workout-plans"],
    description: "Planos de treino",
    action: CommandAction::Open(Screen::WorkoutPlans),
  },
  Command {
    name: "notifications",
    aliases: &["n", "notificacoes"],
    description: "Notificações",
    action: CommandAction::Open(Screen::Notifications),
  },
  Command {
    name: "logout",
    aliases: &["sair"],
    description: "Encerrar sessão",
    action: CommandAction::Logout,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Fechar o gymcrm",
    action: CommandAction::Quit,
  },
];

pub fn find(name: &str) -> Option<&'static Command> {
  let name = name.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == name || cmd.aliases.contains(&name.as_str()))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| {
      let priority = if cmd.name == input_lower {
        0
      } else if cmd.aliases.contains(&input_lower.as_str()) {
        1
      } else if cmd.name.starts_with(&input_lower) {
        2
      } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
        3
      } else if cmd.name.contains(&input_lower) {
        4
      } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
        5
      } else {
        return None;
      };
      Some((cmd, priority))
    })
    .collect();

  // Stable sort keeps table order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
