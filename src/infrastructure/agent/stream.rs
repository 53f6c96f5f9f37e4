//! Streaming variant of the agent loop

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Instant;

use futures::stream::{self, BoxStream, Fuse};
use futures::task::AtomicWaker;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::agent_impl::Agent;
use crate::domain::agent::AgentError;
use crate::domain::llm::{LlmStream, Message};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    waker: AtomicWaker,
}

/// Cancels an [`AgentStream`] from anywhere, including another task
#[derive(Debug, Clone)]
pub struct AgentStreamHandle {
    state: Arc<CancelState>,
}

impl AgentStreamHandle {
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.waker.wake();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }
}

enum StreamState<'a> {
    Connecting {
        agent: &'a mut Agent,
        turn: Vec<Message>,
        start: Instant,
        iterations: usize,
    },
    Streaming {
        agent: &'a mut Agent,
        turn: Vec<Message>,
        start: Instant,
        iterations: usize,
        chunks: LlmStream,
        collected: String,
    },
    Done,
}

/// Text fragments of one streamed agent answer.
///
/// Provider failures, at connect time or mid-stream, count as iterations and
/// the call is retried until the iteration bound, after which the last error
/// is yielded. A stream that completes normally ends the loop; tool calls are
/// not interpreted. The stream is finite and cannot be restarted: once it
/// ends, errors, or is cancelled it yields `None` forever.
pub struct AgentStream<'a> {
    inner: Fuse<BoxStream<'a, Result<String, AgentError>>>,
    cancel: Arc<CancelState>,
}

impl<'a> AgentStream<'a> {
    pub(super) fn new(agent: &'a mut Agent, turn: Vec<Message>) -> Self {
        let initial = StreamState::Connecting {
            agent,
            turn,
            start: Instant::now(),
            iterations: 0,
        };

        Self {
            inner: stream::unfold(initial, step).boxed().fuse(),
            cancel: Arc::new(CancelState::default()),
        }
    }

    pub fn handle(&self) -> AgentStreamHandle {
        AgentStreamHandle {
            state: self.cancel.clone(),
        }
    }

    pub fn cancel(&self) {
        self.handle().cancel();
    }

    /// Drain the stream into one string, stopping at the first error
    pub async fn collect_text(mut self) -> Result<String, AgentError> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for AgentStream<'_> {
    type Item = Result<String, AgentError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.cancel.cancelled.load(Ordering::SeqCst) {
            return Poll::Ready(None);
        }
        this.cancel.waker.register(cx.waker());
        if this.cancel.cancelled.load(Ordering::SeqCst) {
            return Poll::Ready(None);
        }

        this.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for AgentStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentStream")
            .field("cancelled", &self.cancel.cancelled.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Count a failed provider attempt; retry unless the bound is reached
fn retry_or_fail<'a>(
    agent: &'a mut Agent,
    turn: Vec<Message>,
    start: Instant,
    iterations: usize,
    error: DomainError,
) -> Result<StreamState<'a>, AgentError> {
    let iterations = iterations + 1;
    if iterations >= agent.config().max_iterations {
        warn!(iterations = iterations, error = %error, "Streaming attempts exhausted");
        return Err(error.into());
    }

    warn!(attempt = iterations, error = %error, "Streaming attempt failed, retrying");
    Ok(StreamState::Connecting {
        agent,
        turn,
        start,
        iterations,
    })
}

async fn step(
    mut state: StreamState<'_>,
) -> Option<(Result<String, AgentError>, StreamState<'_>)> {
    loop {
        state = match state {
            StreamState::Connecting {
                agent,
                turn,
                start,
                iterations,
            } => {
                if let Err(e) = agent.check_time(start) {
                    return Some((Err(e), StreamState::Done));
                }

                debug!(attempt = iterations + 1, "Opening provider stream");
                let request = agent.build_request(turn.clone(), true);
                let provider = agent.provider().clone();

                match provider.chat_stream(request).await {
                    Ok(chunks) => StreamState::Streaming {
                        agent,
                        turn,
                        start,
                        iterations,
                        chunks,
                        collected: String::new(),
                    },
                    Err(error) => match retry_or_fail(agent, turn, start, iterations, error) {
                        Ok(next) => next,
                        Err(e) => return Some((Err(e), StreamState::Done)),
                    },
                }
            }
            StreamState::Streaming {
                agent,
                turn,
                start,
                iterations,
                mut chunks,
                mut collected,
            } => {
                let received = chunks.next().await;

                match received {
                    Some(Ok(chunk)) => match chunk.delta.filter(|d| !d.is_empty()) {
                        Some(text) => {
                            collected.push_str(&text);
                            let next = StreamState::Streaming {
                                agent,
                                turn,
                                start,
                                iterations,
                                chunks,
                                collected,
                            };
                            return Some((Ok(text), next));
                        }
                        None => StreamState::Streaming {
                            agent,
                            turn,
                            start,
                            iterations,
                            chunks,
                            collected,
                        },
                    },
                    Some(Err(error)) => {
                        match retry_or_fail(agent, turn, start, iterations, error) {
                            Ok(next) => next,
                            Err(e) => return Some((Err(e), StreamState::Done)),
                        }
                    }
                    None => {
                        debug!(chars = collected.len(), "Provider stream completed");
                        agent.remember(turn, collected);
                        return None;
                    }
                }
            }
            StreamState::Done => return None,
        };
    }
}
