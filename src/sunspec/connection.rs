use crate::prelude::*;

use std::collections::HashMap;

use crate::sunspec::brand::{Brand, BrandModel};
use crate::sunspec::cache::SingleFlight;
use crate::sunspec::engine;
use crate::sunspec::models::{
    CommonModel, ControlsModel, InverterModel, InverterModelId, MeterModel, MeterModelId,
    NameplateModel, SettingsModel,
};
use crate::sunspec::schema::{SunSpecModel, WritePayload};
use crate::sunspec::transport::RegisterTransport;

/// "SunS" in ASCII, found in the two registers at the base address.
pub const SUNSPEC_SIGNATURE: u32 = 0x5375_6E53;
/// Model id of the header that terminates the model chain.
pub const END_OF_MODELS: u16 = 0xFFFF;
pub const COMMON_MODEL_ID: u16 = 1;

/// Where one model block lives: `start` is the address of its `ID` register,
/// `length` counts the two header registers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub struct ModelAddress {
    pub start: u16,
    pub length: u16,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModelAddressMap {
    models: HashMap<u16, ModelAddress>,
}

impl ModelAddressMap {
    pub fn get(&self, id: u16) -> Option<ModelAddress> {
        self.models.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.models.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The first id of `preference` present in the map.
    pub fn resolve(&self, preference: &[u16]) -> Result<(u16, ModelAddress)> {
        preference
            .iter()
            .find_map(|id| self.get(*id).map(|address| (*id, address)))
            .ok_or_else(|| {
                SunSpecError::ModelNotFound {
                    ids: preference.to_vec(),
                }
                .into()
            })
    }

    fn insert(&mut self, id: u16, address: ModelAddress) {
        // a device repeating an id keeps its first block
        self.models.entry(id).or_insert(address);
    }
}

fn read_header(registers: &[u16]) -> Result<(u16, u16)> {
    match registers {
        [id, length] => Ok((*id, *length)),
        _ => Err(SunSpecError::RegisterLength {
            expected: 2,
            actual: registers.len(),
        }
        .into()),
    }
}

/// Walks the model chain starting at `base`.
///
/// A bad signature fails straight away; nothing past the signature is read.
pub async fn scan_models(transport: &dyn RegisterTransport, base: u16) -> Result<ModelAddressMap> {
    let signature = transport.read_holding_registers(base, 2).await?;
    let signature = sunspec::codec::decode_uint32(&signature)?;
    if signature != SUNSPEC_SIGNATURE {
        return Err(SunSpecError::InvalidSignature {
            address: base,
            signature,
        }
        .into());
    }

    let mut map = ModelAddressMap::default();
    let mut cursor = base
        .checked_add(2)
        .ok_or(SunSpecError::AddressOverflow { address: base })?;

    loop {
        let (id, length) = read_header(&transport.read_holding_registers(cursor, 2).await?)?;
        if id == END_OF_MODELS {
            if length != 0 {
                debug!("end of models at {} carries length {}", cursor, length);
            }
            break;
        }

        let block = length.checked_add(2).ok_or(SunSpecError::InvalidModelLength {
            id,
            address: cursor,
            length,
        })?;
        debug!("found model {} at {} ({} registers)", id, cursor, block);
        map.insert(
            id,
            ModelAddress {
                start: cursor,
                length: block,
            },
        );

        cursor = cursor
            .checked_add(block)
            .ok_or(SunSpecError::AddressOverflow { address: cursor })?;
    }

    Ok(map)
}

struct Inner {
    name: String,
    base_address: u16,
    transport: Arc<dyn RegisterTransport>,
    // serialises every model read and each write with its read-back
    io: tokio::sync::Mutex<()>,
    address_map: SingleFlight<Arc<ModelAddressMap>>,
    common: SingleFlight<Arc<CommonModel>>,
}

impl Inner {
    async fn read<M: SunSpecModel>(&self, address: u16) -> Result<M> {
        let _io = self.io.lock().await;
        engine::read_model::<M>(self.transport.as_ref(), address).await
    }
}

/// One SunSpec device. Cheap to clone; clones share the session and caches.
#[derive(Clone)]
pub struct SunSpecConnection {
    inner: Arc<Inner>,
}

impl SunSpecConnection {
    pub fn new(name: &str, base_address: u16, transport: Arc<dyn RegisterTransport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.to_string(),
                base_address,
                transport,
                io: tokio::sync::Mutex::new(()),
                address_map: SingleFlight::new(),
                common: SingleFlight::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Scans the device once. Concurrent first callers share a single scan;
    /// a failed scan is retried by the next caller.
    pub async fn model_address_map(&self) -> Result<Arc<ModelAddressMap>> {
        let inner = self.inner.clone();

        self.inner
            .address_map
            .get_or_try_init(move || async move {
                let _io = inner.io.lock().await;
                info!("{}: scanning models from {}", inner.name, inner.base_address);
                let map = scan_models(inner.transport.as_ref(), inner.base_address).await?;
                info!("{}: found {} models {:?}", inner.name, map.len(), map.ids());
                Ok(Arc::new(map))
            })
            .await
    }

    pub async fn common_model(&self) -> Result<Arc<CommonModel>> {
        let map = self.model_address_map().await?;
        let inner = self.inner.clone();

        self.inner
            .common
            .get_or_try_init(move || async move {
                let (_, address) = map.resolve(&[COMMON_MODEL_ID])?;
                let common = inner.read::<CommonModel>(address.start).await?;

                if usize::from(address.length) != CommonModel::LENGTH {
                    debug!(
                        "{}: common model advertises {} registers, read {}",
                        inner.name,
                        address.length,
                        CommonModel::LENGTH
                    );
                }
                info!(
                    "{}: {} {} serial {} version {}",
                    inner.name, common.manufacturer, common.model, common.serial_number, common.version
                );

                Ok(Arc::new(common))
            })
            .await
    }

    pub async fn brand(&self) -> Result<Brand> {
        let common = self.common_model().await?;
        Brand::from_manufacturer(&common.manufacturer)
    }

    async fn read_discovered<M: SunSpecModel>(&self, preference: &[u16]) -> Result<M> {
        let map = self.model_address_map().await?;
        let (id, address) = map.resolve(preference)?;
        debug!("{}: reading {} model {} at {}", self.name(), M::NAME, id, address.start);
        self.inner.read::<M>(address.start).await
    }

    async fn brand_address(&self, model: BrandModel) -> Result<u16> {
        self.brand().await?.require_address(model)
    }

    pub async fn inverter_model(&self) -> Result<InverterModel> {
        self.read_discovered(&InverterModelId::PREFERENCE).await
    }

    pub async fn meter_model(&self) -> Result<MeterModel> {
        self.read_discovered(&MeterModelId::PREFERENCE).await
    }

    pub async fn nameplate_model(&self) -> Result<NameplateModel> {
        let address = self.brand_address(BrandModel::Nameplate).await?;
        self.inner.read(address).await
    }

    pub async fn settings_model(&self) -> Result<SettingsModel> {
        let address = self.brand_address(BrandModel::Settings).await?;
        self.inner.read(address).await
    }

    pub async fn controls_model(&self) -> Result<ControlsModel> {
        let address = self.brand_address(BrandModel::Controls).await?;
        self.inner.read(address).await
    }

    /// Writes the payload and verifies it with no other traffic on this
    /// connection in between.
    pub async fn write_controls_model(
        &self,
        payload: &WritePayload<ControlsModel>,
    ) -> Result<ControlsModel> {
        let address = self.brand_address(BrandModel::Controls).await?;

        let _io = self.inner.io.lock().await;
        engine::write_model(self.inner.transport.as_ref(), address, payload).await
    }
}
