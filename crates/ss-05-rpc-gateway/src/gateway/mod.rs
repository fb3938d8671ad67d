//! # RPC Gateway
//!
//! Owns the `category.command` namespace. Inbound delivery from the
//! transport goes through [`RpcGateway::handle_inbound`], which checks the
//! message size and the category's access rule, then queues the request on
//! the category's bounded queue. Anything refused gets one `(status, reason)`
//! reply and never reaches a handler.
//!
//! The category table and authorization rules are fixed once [`build`]
//! returns.
//!
//! [`build`]: RpcGatewayBuilder::build

mod pool;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use shared_types::Message;

use crate::domain::{
    Access, CategoryBudget, CategoryCounters, GatewayConfig, GatewayError, GatewayStats,
    CATEGORY_MONITOR, CATEGORY_NOTIFY, CATEGORY_SERVICE, CATEGORY_SN, CATEGORY_STORAGE,
};
use crate::handlers::CommandHandler;
use pool::{CategoryQueue, Job, PushError, WorkerPool};

/// Categories every gateway declares, with their access rules.
const CATEGORIES: [(&str, Access); 5] = [
    (CATEGORY_SN, Access::PEER),
    (CATEGORY_STORAGE, Access::PUBLIC),
    (CATEGORY_MONITOR, Access::PUBLIC),
    (CATEGORY_SERVICE, Access::ADMIN),
    (CATEGORY_NOTIFY, Access::ADMIN),
];

struct PendingCategory {
    access: Access,
    budget: CategoryBudget,
    commands: HashMap<String, Arc<dyn CommandHandler>>,
}

/// Collects command registrations before the workers start.
pub struct RpcGatewayBuilder {
    config: GatewayConfig,
    stats: Arc<GatewayStats>,
    counters: HashMap<&'static str, Arc<CategoryCounters>>,
    categories: BTreeMap<&'static str, PendingCategory>,
}

impl RpcGatewayBuilder {
    fn new(config: GatewayConfig) -> Self {
        let mut stats = GatewayStats::default();
        let mut counters = HashMap::new();
        let mut categories = BTreeMap::new();
        let budgets: HashMap<_, _> = config.categories.iter().collect();

        for (name, access) in CATEGORIES {
            counters.insert(name, stats.register(name));
            let budget = budgets
                .get(name)
                .copied()
                .unwrap_or(CategoryBudget::new(0, 1));
            categories.insert(
                name,
                PendingCategory {
                    access,
                    budget,
                    commands: HashMap::new(),
                },
            );
        }

        Self {
            config,
            stats: Arc::new(stats),
            counters,
            categories,
        }
    }

    /// Counters the built gateway will update.
    pub fn stats(&self) -> Arc<GatewayStats> {
        self.stats.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Register `category.command`.
    pub fn add_command(
        &mut self,
        category: &str,
        command: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<&mut Self, GatewayError> {
        let pending = self
            .categories
            .get_mut(category)
            .ok_or_else(|| GatewayError::UnknownCategory(category.to_string()))?;
        if pending.commands.contains_key(command) {
            return Err(GatewayError::DuplicateCommand(format!(
                "{}.{}",
                category, command
            )));
        }
        pending.commands.insert(command.to_string(), handler);
        Ok(self)
    }

    /// Validate the configuration and start one dispatcher per category.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<RpcGateway, GatewayError> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|_| GatewayError::NoRuntime)?;
        let mut pool = WorkerPool::new(runtime, self.config.general_workers);

        let mut categories = HashMap::new();
        for (name, pending) in self.categories {
            let queue = pool.spawn_queue(name, pending.budget);
            let counters = self.counters.get(name).cloned().unwrap_or_default();
            debug!(
                category = name,
                commands = pending.commands.len(),
                reserved_threads = pending.budget.reserved_threads,
                max_queue = pending.budget.max_queue,
                "category ready"
            );
            categories.insert(
                name.to_string(),
                Category {
                    access: pending.access,
                    commands: pending.commands,
                    queue,
                    counters,
                },
            );
        }

        info!(
            categories = categories.len(),
            general_workers = self.config.general_workers,
            "rpc gateway started"
        );

        Ok(RpcGateway {
            max_message_size: self.config.max_message_size,
            categories,
            stats: self.stats,
            pool,
        })
    }
}

struct Category {
    access: Access,
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    queue: CategoryQueue,
    counters: Arc<CategoryCounters>,
}

/// Dispatches inbound `category.command` messages to registered handlers.
pub struct RpcGateway {
    max_message_size: usize,
    categories: HashMap<String, Category>,
    stats: Arc<GatewayStats>,
    pool: WorkerPool,
}

impl RpcGateway {
    pub fn builder(config: GatewayConfig) -> RpcGatewayBuilder {
        RpcGatewayBuilder::new(config)
    }

    pub fn stats(&self) -> Arc<GatewayStats> {
        self.stats.clone()
    }

    /// Every registered `category.command`, sorted.
    pub fn commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .categories
            .iter()
            .flat_map(|(category, c)| {
                c.commands
                    .keys()
                    .map(move |command| format!("{}.{}", category, command))
            })
            .collect();
        names.sort();
        names
    }

    /// Stop accepting work. Queued and later requests get a 503 reply;
    /// commands already running finish normally.
    pub fn shutdown(&self) {
        info!("rpc gateway shutting down");
        self.pool.close();
    }

    /// Entry point for the transport. Replies exactly once, possibly later
    /// from a worker.
    pub fn handle_inbound(&self, name: &str, message: Message) {
        let routed = self.route(name, &message);
        match routed {
            Ok((category, handler)) => self.enqueue(name, category, handler, message),
            Err(err) => reject(message, err),
        }
    }

    fn route(
        &self,
        name: &str,
        message: &Message,
    ) -> Result<(&Category, Arc<dyn CommandHandler>), GatewayError> {
        let unknown = || GatewayError::UnknownCommand(name.to_string());
        let (category_name, command) = name.split_once('.').ok_or_else(unknown)?;
        let category = self.categories.get(category_name).ok_or_else(unknown)?;

        if let Err(reason) = category.access.check(&message.conn) {
            category.counters.record_forbidden();
            warn!(
                command = name,
                remote = %message.conn.remote,
                auth = %message.conn.auth,
                reason,
                "rejected command"
            );
            return Err(GatewayError::Forbidden {
                command: name.to_string(),
                reason,
            });
        }

        let handler = category.commands.get(command).cloned().ok_or_else(unknown)?;

        let size = message.size();
        if size > self.max_message_size {
            warn!(command = name, size, "rejected oversized message");
            return Err(GatewayError::MessageTooLarge {
                size,
                max: self.max_message_size,
            });
        }

        Ok((category, handler))
    }

    fn enqueue(
        &self,
        name: &str,
        category: &Category,
        handler: Arc<dyn CommandHandler>,
        message: Message,
    ) {
        let job = Job {
            command: name.to_string(),
            handler,
            message,
        };
        match category.queue.try_push(job) {
            Ok(()) => category.counters.record_dispatched(),
            Err(PushError::Full(job)) => {
                category.counters.record_busy();
                let category_name = category_of(name);
                warn!(command = name, "queue full, rejecting request");
                reject(
                    job.message,
                    GatewayError::Busy {
                        category: category_name.to_string(),
                    },
                );
            }
            Err(PushError::Closed(job)) => reject(
                job.message,
                GatewayError::Closed {
                    category: category_of(name).to_string(),
                },
            ),
        }
    }
}

fn category_of(name: &str) -> &str {
    name.split_once('.').map_or(name, |(category, _)| category)
}

fn reject(message: Message, err: GatewayError) {
    debug!(remote = %message.conn.remote, error = %err, "replying with gateway error");
    message.reply.reply_response(err.to_response(), false);
}
