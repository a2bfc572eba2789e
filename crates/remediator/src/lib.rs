//! Webhook agent that turns monitoring alerts into Kubernetes remediation
//! actions, with human notification.
//!
//! The pipeline for one inbound alert is:
//!
//! 1. Parse the Alertmanager webhook payload ([`types`])
//! 2. Ask the advisory source for an analysis of the alert ([`advisory`])
//! 3. Extract a structured remediation intent from the free-form analysis
//!    ([`intent`])
//! 4. Decide whether and how to act ([`policy`])
//! 5. Execute the action against the cluster, with a kubectl fallback
//!    ([`executor`])
//! 6. Report the full chain of reasoning and outcome via the `notify` crate
//!
//! Steps 2-6 are sequenced by [`pipeline::Pipeline`]; the HTTP boundary lives
//! in [`server`].

pub mod advisory;
pub mod config;
pub mod error;
pub mod executor;
pub mod intent;
pub mod pipeline;
pub mod policy;
pub mod server;
pub mod types;
