//! Client profile and address book

use shared::models::{AddressInput, ClientAccount, ClientUpdate};
use shared::types::Id;
use shared::util::{normalize_email, now_millis, snowflake_id};

use crate::db::{Storage, StorageError};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_optional_text,
    validate_required_text, validate_text_len,
};
use crate::utils::{AppError, AppResult, ErrorCode};

pub(crate) fn client_not_found(mail: &str) -> AppError {
    AppError::with_message(ErrorCode::ClientNotFound, format!("Client not found: {mail}"))
        .with_detail("mail", mail)
}

fn validate_address(input: &AddressInput) -> AppResult<()> {
    validate_required_text(&input.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&input.actual, "actual", MAX_ADDRESS_LEN)?;
    validate_text_len(&input.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&input.link, "link", MAX_URL_LEN)?;
    if let Some(point) = input.point
        && (!(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lon))
    {
        return Err(AppError::validation("point is out of range").with_detail("field", "point"));
    }
    Ok(())
}

fn validate_update(update: &ClientUpdate) -> AppResult<()> {
    match update {
        ClientUpdate::FullName(name) => validate_required_text(name, "fullName", MAX_NAME_LEN),
        ClientUpdate::Phone(phone) => validate_required_text(phone, "phone", MAX_SHORT_TEXT_LEN),
        ClientUpdate::PushToken(token) => validate_optional_text(token, "pushToken", MAX_URL_LEN),
        ClientUpdate::PaymentPreference(_) => Ok(()),
    }
}

/// Profile reads and edits
///
/// Edits run in a write transaction, so they serialise with ledger mutations
/// on the same record.
#[derive(Debug, Clone)]
pub struct ClientService {
    storage: Storage,
}

impl ClientService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn get_client(&self, mail: &str) -> AppResult<ClientAccount> {
        let mail = normalize_email(mail);
        self.storage
            .find_client_by_email(&mail)?
            .ok_or_else(|| client_not_found(&mail))
    }

    /// Read-modify-write a client under one write transaction
    fn modify<F>(&self, mail: &str, f: F) -> AppResult<ClientAccount>
    where
        F: FnOnce(&mut ClientAccount) -> AppResult<()>,
    {
        let mail = normalize_email(mail);
        let txn = self.storage.begin_write()?;
        let mut client = self
            .storage
            .find_client_by_email_txn(&txn, &mail)?
            .ok_or_else(|| client_not_found(&mail))?;

        f(&mut client)?;
        client.updated_at = now_millis();
        self.storage.put_client(&txn, &client)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(client)
    }

    pub fn update_client(&self, mail: &str, update: ClientUpdate) -> AppResult<ClientAccount> {
        validate_update(&update)?;
        let client = self.modify(mail, |client| {
            update.apply(client);
            Ok(())
        })?;
        tracing::info!(client = %client.mail, "Client profile updated");
        Ok(client)
    }

    pub fn add_address(&self, mail: &str, input: AddressInput) -> AppResult<ClientAccount> {
        validate_address(&input)?;
        self.modify(mail, |client| {
            let id = unused_address_id(client, snowflake_id);
            client.addresses.push(input.into_address(id));
            Ok(())
        })
    }

    /// Replace an address in place, keeping its id
    pub fn update_address(
        &self,
        mail: &str,
        address_id: Id,
        input: AddressInput,
    ) -> AppResult<ClientAccount> {
        validate_address(&input)?;
        self.modify(mail, |client| {
            let slot = client
                .addresses
                .iter_mut()
                .find(|a| a.id == address_id)
                .ok_or_else(|| address_not_found(address_id))?;
            *slot = input.into_address(address_id);
            Ok(())
        })
    }

    pub fn remove_address(&self, mail: &str, address_id: Id) -> AppResult<ClientAccount> {
        self.modify(mail, |client| {
            let before = client.addresses.len();
            client.addresses.retain(|a| a.id != address_id);
            if client.addresses.len() == before {
                return Err(address_not_found(address_id));
            }
            Ok(())
        })
    }
}

/// Draw ids until one is not used by another address of this client
fn unused_address_id(client: &ClientAccount, mut next: impl FnMut() -> Id) -> Id {
    loop {
        let id = next();
        if client.addresses.iter().all(|a| a.id != id) {
            return id;
        }
    }
}

fn address_not_found(address_id: Id) -> AppError {
    AppError::with_message(ErrorCode::AddressNotFound, format!("Address not found: {address_id}"))
        .with_detail("address_id", address_id)
}
