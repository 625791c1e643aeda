//! Connection lifecycle as a pure transition function.
//!
//! The client feeds [`Event`]s into [`transition`] and carries out the returned
//! [`Action`]s. Keeping the table free of I/O makes every path testable without a socket.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Start a connection attempt (startup or reconnect timer fired).
    Dial,
    Connected,
    ConnectFailed,
    /// The open connection was closed by the peer or failed.
    Closed,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Dial,
    StartPushTimer,
    StopPushTimer,
    ScheduleReconnect,
    CloseTransport,
}

/// Returns the next state and the actions to perform for `event` in `state`.
///
/// Events that make no sense in the current state (a stale `Closed` after a reconnect was
/// already scheduled, a second `Dial` while connecting) are ignored.
pub fn transition(state: ConnectionState, event: Event) -> (ConnectionState, Vec<Action>) {
    use Action::*;
    use ConnectionState::*;

    match (state, event) {
        (Disconnected, Event::Dial) => (Connecting, vec![Dial]),
        (Connecting, Event::Connected) => (Open, vec![StartPushTimer]),
        (Connecting, Event::ConnectFailed) => (Disconnected, vec![ScheduleReconnect]),
        (Open, Event::Closed) => (
            Disconnected,
            vec![StopPushTimer, CloseTransport, ScheduleReconnect],
        ),
        (Open, Event::Stop) => (Disconnected, vec![StopPushTimer, CloseTransport]),
        (Connecting | Disconnected, Event::Stop) => (Disconnected, Vec::new()),
        (state, _) => (state, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [ConnectionState; 3] = [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Open,
    ];
    const EVENTS: [Event; 5] = [
        Event::Dial,
        Event::Connected,
        Event::ConnectFailed,
        Event::Closed,
        Event::Stop,
    ];

    #[test]
    fn test_happy_path() {
        let (s, a) = transition(ConnectionState::Disconnected, Event::Dial);
        assert_eq!((s, a), (ConnectionState::Connecting, vec![Action::Dial]));
        let (s, a) = transition(s, Event::Connected);
        assert_eq!((s, a), (ConnectionState::Open, vec![Action::StartPushTimer]));
    }

    #[test]
    fn test_close_schedules_exactly_one_reconnect() {
        let (s, actions) = transition(ConnectionState::Open, Event::Closed);
        assert_eq!(s, ConnectionState::Disconnected);
        assert_eq!(
            actions,
            vec![
                Action::StopPushTimer,
                Action::CloseTransport,
                Action::ScheduleReconnect
            ]
        );

        // a duplicate close notification must not schedule a second reconnect
        let (s, actions) = transition(s, Event::Closed);
        assert_eq!(s, ConnectionState::Disconnected);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_failed_connect_schedules_reconnect() {
        let (s, actions) = transition(ConnectionState::Connecting, Event::ConnectFailed);
        assert_eq!(s, ConnectionState::Disconnected);
        assert_eq!(actions, vec![Action::ScheduleReconnect]);
    }

    #[test]
    fn test_stop_never_reconnects() {
        for state in STATES {
            let (s, actions) = transition(state, Event::Stop);
            assert_eq!(s, ConnectionState::Disconnected);
            assert!(!actions.contains(&Action::ScheduleReconnect));
            assert!(!actions.contains(&Action::Dial));
        }
        let (_, actions) = transition(ConnectionState::Open, Event::Stop);
        assert_eq!(actions, vec![Action::StopPushTimer, Action::CloseTransport]);
    }

    #[test]
    fn test_push_timer_only_runs_while_open() {
        // walk every (state, event) pair and track whether the timer would be running
        for state in STATES {
            for event in EVENTS {
                let (next, actions) = transition(state, event);
                if actions.contains(&Action::StartPushTimer) {
                    assert_eq!(next, ConnectionState::Open);
                }
                if state == ConnectionState::Open && next != ConnectionState::Open {
                    assert!(actions.contains(&Action::StopPushTimer), "{state:?} + {event:?}");
                }
            }
        }
    }

    #[test]
    fn test_ignored_events_keep_state() {
        let ignored = [
            (ConnectionState::Connecting, Event::Dial),
            (ConnectionState::Open, Event::Dial),
            (ConnectionState::Open, Event::Connected),
            (ConnectionState::Disconnected, Event::Connected),
            (ConnectionState::Disconnected, Event::ConnectFailed),
            (ConnectionState::Connecting, Event::Closed),
        ];
        for (state, event) in ignored {
            assert_eq!(transition(state, event), (state, Vec::new()), "{state:?} + {event:?}");
        }
    }
}
