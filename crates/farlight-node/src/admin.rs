use farlight_core::Address;
use thiserror::Error;

/// Errors from the admin gate.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("caller {caller} is not the admin")]
    Unauthorized { caller: String },

    #[error("caller {caller} is not the pending admin")]
    NotPendingAdmin { caller: String },

    #[error("no pending admin transfer")]
    NoPendingTransfer,
}

/// Single admin with two-step transfer: the current admin nominates a
/// pending admin, who must accept before the transfer takes effect.
///
/// Only configuration changes go through the gate — header appends and
/// proof verification are open to any caller.
#[derive(Clone, Debug)]
pub struct AdminGate {
    admin: Address,
    pending: Option<Address>,
}

impl AdminGate {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            pending: None,
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn pending(&self) -> Option<Address> {
        self.pending
    }

    /// Require `caller` to be the current admin.
    pub fn ensure(&self, caller: Address) -> Result<(), AdminError> {
        if caller == self.admin {
            Ok(())
        } else {
            Err(AdminError::Unauthorized {
                caller: hex::encode(caller),
            })
        }
    }

    /// Nominate a new admin. Admin-gated; overwrites any earlier nomination.
    pub fn set_pending(&mut self, caller: Address, new_admin: Address) -> Result<(), AdminError> {
        self.ensure(caller)?;
        self.pending = Some(new_admin);
        Ok(())
    }

    /// Complete the transfer. Only the nominated address may accept.
    pub fn accept(&mut self, caller: Address) -> Result<(), AdminError> {
        match self.pending {
            None => Err(AdminError::NoPendingTransfer),
            Some(pending) if pending == caller => {
                self.admin = pending;
                self.pending = None;
                Ok(())
            }
            Some(_) => Err(AdminError::NotPendingAdmin {
                caller: hex::encode(caller),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Address = [0xA1; 20];
    const BOB: Address = [0xB2; 20];
    const MALLORY: Address = [0xEE; 20];

    #[test]
    fn two_step_transfer() {
        let mut gate = AdminGate::new(ALICE);
        gate.set_pending(ALICE, BOB).unwrap();
        // Nomination alone changes nothing.
        assert_eq!(gate.admin(), ALICE);

        gate.accept(BOB).unwrap();
        assert_eq!(gate.admin(), BOB);
        assert!(gate.pending().is_none());
    }

    #[test]
    fn non_admin_cannot_nominate() {
        let mut gate = AdminGate::new(ALICE);
        assert!(matches!(
            gate.set_pending(MALLORY, MALLORY),
            Err(AdminError::Unauthorized { .. })
        ));
    }

    #[test]
    fn only_nominee_can_accept() {
        let mut gate = AdminGate::new(ALICE);
        gate.set_pending(ALICE, BOB).unwrap();
        assert!(matches!(
            gate.accept(MALLORY),
            Err(AdminError::NotPendingAdmin { .. })
        ));
        assert_eq!(gate.admin(), ALICE);
    }

    #[test]
    fn accept_without_nomination_fails() {
        let mut gate = AdminGate::new(ALICE);
        assert!(matches!(
            gate.accept(BOB),
            Err(AdminError::NoPendingTransfer)
        ));
    }
}
