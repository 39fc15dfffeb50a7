/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use kanal::{AsyncReceiver, AsyncSender};
use crate::{adsb::Message, errors::{OdinAdsbDistError, Result}};

/// create the unbounded FIFO that hands messages from the feed client to the aggregator
pub fn msg_queue ()->(MsgSender,MsgReceiver) {
    let (tx,rx) = kanal::unbounded_async();
    (MsgSender(tx), MsgReceiver(rx))
}

/// producer end. Cloneable, pushing never waits for the consumer
#[derive(Clone)]
pub struct MsgSender(AsyncSender<Message>);

impl MsgSender {
    pub async fn push (&self, msg: Message)->Result<()> {
        self.0.send( msg).await.map_err( |_| OdinAdsbDistError::QueueClosed)
    }
}

/// consumer end
pub struct MsgReceiver(AsyncReceiver<Message>);

impl MsgReceiver {
    pub fn len (&self)->usize { self.0.len() }
    pub fn is_empty (&self)->bool { self.0.is_empty() }

    /// remove the messages that are queued at the time of the call (in FIFO order). Messages
    /// pushed while we drain are left for the next call
    pub fn drain_pending (&self)->Vec<Message> {
        let n = self.0.len();
        let mut msgs = Vec::with_capacity(n);

        for _ in 0..n {
            match self.0.try_recv() {
                Ok(Some(msg)) => msgs.push(msg),
                _ => break
            }
        }
        msgs
    }

    /// wait for the next message. Returns None if all senders are gone and the queue is empty
    pub async fn recv (&self)->Option<Message> {
        self.0.recv().await.ok()
    }
}
