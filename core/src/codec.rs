use rkyv::api::high::{HighDeserializer, HighSerializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

pub fn encode<T>(value: &T) -> Option<Vec<u8>>
where
    T: for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>>,
{
    rkyv::to_bytes::<Error>(value).ok().map(|bytes| bytes.into_vec())
}

pub fn decode<T>(bytes: &[u8]) -> Option<T>
where
    T: Archive,
    T::Archived:
        for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<T, HighDeserializer<Error>>,
{
    rkyv::from_bytes::<T, Error>(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ClientMsg;

    #[test]
    fn garbage_bytes_do_not_decode() {
        assert!(decode::<ClientMsg>(&[0xff, 0x01, 0x02]).is_none());
    }

    #[test]
    fn command_survives_the_wire() {
        let msg = ClientMsg::Roll {
            room_id: "0badc0de".to_string(),
            player_id: "12ab34cd".to_string(),
        };
        let bytes = encode(&msg).expect("encode");
        let back = decode::<ClientMsg>(&bytes).expect("decode");
        match back {
            ClientMsg::Roll { room_id, player_id } => {
                assert_eq!(room_id, "0badc0de");
                assert_eq!(player_id, "12ab34cd");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
