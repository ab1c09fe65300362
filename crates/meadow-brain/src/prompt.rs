//! Prompt template loading and rendering via `minijinja`.
//!
//! The system message carries the agent's personality, the roster of
//! other agents, a description of the meadow, and the response contract.
//! The user message carries the current state and observations, unread
//! messages, notifications, and the agent's memory.
//!
//! Built-in templates are compiled into the binary. Operators can tune
//! agent behavior without recompiling by pointing `LLM_TEMPLATES_DIR` at a
//! directory containing `system.j2` and `user.j2`.

use minijinja::{Environment, context};
use meadow_core::DecisionRequest;

use crate::error::BrainError;
use crate::memory::AgentMemory;

const SYSTEM_TEMPLATE: &str = "\
PERSONALITY: You are {{ name }}, {{ personality }}. Act consistently with this personality in all your actions and communications.
{% if others %}
OTHER AGENTS IN THE WORLD:
{% for other in others %}- {{ other.name }}: {{ other.personality }}. You can text {{ other.name }} anytime with the say_to tool and agent \"{{ other.name }}\".
{% endfor %}{% endif %}
ENVIRONMENT: You live in a small meadow on a flat plane where x and z both run from -4 to 4. \
Coins are scattered across the meadow; walk right up to one to pick it up. \
You only see agents and objects close to you, so move around to discover more. \
Other agents may text you at any time and their messages will show up here.

RESPONSE FORMAT: Always answer by calling exactly one tool. Use move_to to walk to a point, \
say_to to text another agent by name, idle to rest for a few seconds, or observe to take a fresh look around. \
If you cannot call tools, reply with a single JSON object such as \
{\"action\": \"move\", \"target\": {\"x\": 1.0, \"z\": -2.0}}.";

const USER_TEMPLATE: &str = "\
Current State:
Position: {{ position }}. Simulation Time: {{ time_s }}s. Currently: {{ action }}.
Coins collected: {{ coins_collected }}. Coins left in the meadow: {{ coins_remaining }}.

Current Observations:
{% for line in observations %}- {{ line }}
{% else %}- No specific observations
{% endfor %}
Messages:
{% for m in messages %}- {{ m.sender }} says: \"{{ m.message }}\"
{% else %}- No new messages
{% endfor %}{% if notifications %}
Notifications:
{% for n in notifications %}- {{ n }}
{% endfor %}{% endif %}
Past Actions (what I decided to do):
{% for m in past_actions %}- Time {{ m.time_s }}s: {{ m.summary }}
{% else %}- No recent actions
{% endfor %}
Past Observations (what I saw before):
{% for m in past_observations %}- Time {{ m.time_s }}s: {{ m.summary }}
{% else %}- No recent observations
{% endfor %}";

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System message establishing who the agent is.
    pub system: String,
    /// User message describing what the agent knows right now.
    pub user: String,
}

/// Manages prompt templates.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

impl PromptEngine {
    /// A prompt engine using the built-in templates.
    pub fn new() -> Result<Self, BrainError> {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)?;
        env.add_template("user", USER_TEMPLATE)?;
        Ok(Self { env })
    }

    /// A prompt engine loading `system.j2` and `user.j2` from `dir`.
    pub fn from_dir(dir: &str) -> Result<Self, BrainError> {
        let mut env = Environment::new();
        env.add_template_owned("system", load_template(dir, "system.j2")?)?;
        env.add_template_owned("user", load_template(dir, "user.j2")?)?;
        Ok(Self { env })
    }

    /// Render both messages for one decision request.
    pub fn render(
        &self,
        request: &DecisionRequest,
        memory: &AgentMemory,
    ) -> Result<RenderedPrompt, BrainError> {
        let system = self.env.get_template("system")?.render(context! {
            name => &request.profile.name,
            personality => &request.profile.personality,
            others => &request.roster,
        })?;

        let snapshot = &request.snapshot;
        let user = self.env.get_template("user")?.render(context! {
            position => format!("({:.1}, {:.1})", snapshot.position.x, snapshot.position.z),
            time_s => snapshot.simulation_time_ms / 1000,
            action => snapshot.action.as_str(),
            coins_collected => snapshot.coins_collected,
            coins_remaining => snapshot.coins_remaining,
            observations => snapshot.observation_lines(),
            messages => &request.messages,
            notifications => &request.notifications,
            past_actions => &memory.decisions,
            past_observations => &memory.observations,
        })?;

        Ok(RenderedPrompt { system, user })
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, BrainError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path).map_err(|source| BrainError::TemplateFile { path, source })
}
