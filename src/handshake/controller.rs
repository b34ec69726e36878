//! Login handshake controller
//!
//! Drives a complete login: encode and send LOGIN7, then consume the
//! server's reply stream, relaying security continuation tokens through
//! the [`SecurityContextProvider`] until the server either acknowledges
//! the login or rejects it. The controller owns the protocol choreography;
//! I/O and security mechanics stay behind their traits.

use std::collections::VecDeque;

use crate::auth::{ContinuationOutcome, SecurityContextProvider};
use crate::config::LoginConfiguration;
use crate::error::{Result, TdsError};
use crate::protocol::constants::{packet_type, status};
use crate::protocol::tokens::LoginAck;
use crate::protocol::{encode_login7, Login7Message, TdsPacket, Token, TokenStreamDecoder};

use super::transport::PacketTransport;

/// Where the controller stands in the login exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// LOGIN7 not yet sent
    AwaitingInitialToken,
    /// LOGIN7 sent; reading the server reply stream
    AwaitingServerResponse,
    /// A continuation token was sent; reading the server's next leg
    ContinuingAuthentication,
    /// Terminal: the login succeeded or failed
    Done,
}

impl HandshakeState {
    /// Transition taken when a reply packet arrives: a sent continuation
    /// has been answered, so the controller is back to reading the
    /// server's response.
    fn on_reply_received(self) -> Self {
        match self {
            HandshakeState::ContinuingAuthentication => HandshakeState::AwaitingServerResponse,
            other => other,
        }
    }
}

/// Orchestrates one login attempt over a [`PacketTransport`].
///
/// Single use: after [`run`](LoginHandshakeController::run) returns, the
/// controller is in [`HandshakeState::Done`] and must not be reused.
#[derive(Debug)]
pub struct LoginHandshakeController<'a> {
    config: &'a LoginConfiguration,
    decoder: TokenStreamDecoder,
    state: HandshakeState,
}

impl<'a> LoginHandshakeController<'a> {
    /// Create a controller for one login attempt.
    pub fn new(config: &'a LoginConfiguration) -> Self {
        Self {
            config,
            decoder: TokenStreamDecoder::new(),
            state: HandshakeState::AwaitingInitialToken,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Run the login exchange to completion.
    ///
    /// On success returns the server's login acknowledgement, or `None` in
    /// the odd case where the server ends the reply without either a
    /// LOGINACK or an error. Any error leaves the controller in
    /// [`HandshakeState::Done`]; the connection should be discarded.
    pub async fn run<T, P>(
        &mut self,
        transport: &mut T,
        provider: &mut P,
    ) -> Result<Option<LoginAck>>
    where
        T: PacketTransport,
        P: SecurityContextProvider,
    {
        let result = self.drive(transport, provider).await;
        self.state = HandshakeState::Done;
        result
    }

    async fn drive<T, P>(
        &mut self,
        transport: &mut T,
        provider: &mut P,
    ) -> Result<Option<LoginAck>>
    where
        T: PacketTransport,
        P: SecurityContextProvider,
    {
        let integrated = self.config.auth.uses_integrated_security();

        // Acquire the initial mechanism token before anything hits the
        // wire, so a setup failure sends nothing.
        let security_token = if integrated {
            let token = provider.initial_token().await.map_err(|err| match err {
                err @ TdsError::AuthSetup(_) => err,
                other => TdsError::AuthSetup(format!(
                    "failed to acquire initial security token: {}",
                    other
                )),
            })?;
            Some(token)
        } else {
            None
        };

        let message = Login7Message::from_config(self.config, security_token);
        let payload = encode_login7(&message)?;
        debug!(
            server = %self.config.server,
            database = %self.config.database,
            integrated,
            payload_len = payload.len(),
            "sending LOGIN7"
        );
        transport
            .send(vec![TdsPacket::new(
                packet_type::LOGIN7,
                status::EOM,
                payload,
            )])
            .await?;
        self.state = HandshakeState::AwaitingServerResponse;

        let mut pending: VecDeque<Token> = VecDeque::new();
        let mut login_ack: Option<LoginAck> = None;
        let mut auth_complete = !integrated;

        'receive: loop {
            let packet = transport.receive().await?;
            self.state = self.state.on_reply_received();
            let end_of_message = packet.is_end_of_message();
            trace!(
                packet_type = packet.header.packet_type,
                payload_len = packet.payload.len(),
                end_of_message,
                "received reply packet"
            );
            pending.extend(self.decoder.feed(&packet.payload)?);

            while let Some(token) = pending.pop_front() {
                match token {
                    Token::SecurityContinuation(server_token) => {
                        let outcome = provider
                            .continue_authentication(&server_token)
                            .await
                            .map_err(|err| match err {
                                err @ TdsError::AuthHandshake(_) => err,
                                other => TdsError::AuthHandshake(format!(
                                    "security context rejected server token: {}",
                                    other
                                )),
                            })?;
                        if outcome.is_complete {
                            auth_complete = true;
                        }
                        if let ContinuationOutcome {
                            next_token: Some(next_token),
                            ..
                        } = outcome
                        {
                            debug!(
                                token_len = next_token.len(),
                                "sending authentication continuation"
                            );
                            transport
                                .send(vec![TdsPacket::new(
                                    packet_type::SSPI,
                                    status::EOM,
                                    next_token,
                                )])
                                .await?;
                            self.state = HandshakeState::ContinuingAuthentication;
                            // One outbound leg per inbound packet; leftover
                            // tokens stay queued until the next reply.
                            continue 'receive;
                        }
                    }
                    Token::Error(message) => {
                        if message.is_failure() {
                            return Err(TdsError::ServerRejection {
                                number: message.number,
                                severity: message.severity,
                                message: message.message,
                            });
                        }
                        debug!(
                            number = message.number,
                            severity = message.severity,
                            "server error message: {}",
                            message.message
                        );
                    }
                    Token::Info(message) => {
                        debug!(
                            number = message.number,
                            "server info message: {}",
                            message.message
                        );
                    }
                    Token::LoginAck(ack) => {
                        info!(
                            tds_version = format_args!("0x{:08X}", ack.tds_version),
                            server = %ack.prog_name,
                            "login acknowledged"
                        );
                        login_ack = Some(ack);
                    }
                    Token::Done(done) | Token::DoneProc(done) | Token::DoneInProc(done) => {
                        if done.has_error() {
                            return Err(TdsError::Protocol(format!(
                                "login reply DONE carries error status 0x{:04X}",
                                done.status
                            )));
                        }
                    }
                    Token::EnvChange(env) => {
                        trace!(env_type = env.env_type, "environment change");
                    }
                    // Some servers attach result data to the login reply;
                    // it carries nothing the handshake needs.
                    Token::ColumnMetadata(_) | Token::Row(_) => {}
                }
            }

            if end_of_message {
                if integrated && !auth_complete {
                    warn!("server ended login reply before the security exchange completed");
                }
                return Ok(login_ack);
            }
        }
    }
}

/// Run a complete login attempt with a fresh controller.
pub async fn login<T, P>(
    config: &LoginConfiguration,
    transport: &mut T,
    provider: &mut P,
) -> Result<Option<LoginAck>>
where
    T: PacketTransport,
    P: SecurityContextProvider,
{
    LoginHandshakeController::new(config).run(transport, provider).await
}
