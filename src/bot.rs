use crate::conversation::Controller;
use crate::gateway::{BotGateway, Incoming};
use crate::render::VideoRenderer;
use crate::session::SessionStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Polling loop that hands every update to its own task.
///
/// A failing update only resets its own chat; a failing poll is retried after
/// `restart_delay`. Neither takes the process down.
pub struct Bot<G, S, R> {
    gateway: Arc<G>,
    controller: Arc<Controller<G, S, R>>,
    restart_delay: Duration,
}

impl<G, S, R> Bot<G, S, R>
where
    G: BotGateway,
    S: SessionStore,
    R: VideoRenderer,
{
    pub fn new(gateway: Arc<G>, controller: Controller<G, S, R>, restart_delay: Duration) -> Self {
        Self {
            gateway,
            controller: Arc::new(controller),
            restart_delay,
        }
    }

    /// Poll until `shutdown` resolves.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut offset = 0;
        info!("Polling for updates");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down");
                    return;
                }
                polled = self.gateway.poll(offset) => match polled {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.id + 1);
                            if let Some(incoming) = update.incoming {
                                self.dispatch(incoming);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Polling failed: {:#}; retrying in {:?}", e, self.restart_delay);
                        tokio::select! {
                            _ = &mut shutdown => {
                                info!("Shutting down");
                                return;
                            }
                            _ = tokio::time::sleep(self.restart_delay) => {}
                        }
                    }
                },
            }
        }
    }

    /// Handle one update on its own task.
    pub fn dispatch(&self, incoming: Incoming) -> JoinHandle<()> {
        let controller = self.controller.clone();
        tokio::spawn(async move {
            let chat = incoming.chat();
            let worker = tokio::spawn({
                let controller = controller.clone();
                async move { controller.handle(incoming).await }
            });
            let failure = match worker.await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => format!("{:#}", e),
                Err(e) => format!("task aborted: {}", e),
            };
            error!(chat, "Update handler failed, resetting session: {}", failure);
            controller.sessions().reset(chat);
        })
    }
}
