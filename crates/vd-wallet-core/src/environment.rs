use std::rc::Rc;
use vd_chain_client::{InjectedProvider, Transport};
use vd_storage::NetIdSlots;

/// Host capabilities the connector needs: the page's wallet provider, its
/// storage, and its document.
pub trait Environment {
    fn provider(&self) -> InjectedProvider;

    fn net_id_slots(&self) -> NetIdSlots;

    fn set_title(&self, title: &str);

    /// Full page reload.
    fn reload(&self);

    /// Plain RPC transport for a registry endpoint.
    fn rpc_transport(&self, url: &str) -> Rc<dyn Transport>;
}
