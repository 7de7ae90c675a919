mod clean;
mod state;

#[cfg(test)]
mod tests;

use libxml::tree::{Document, Node, NodeType};

use self::state::State;
use crate::constants;
use crate::error::ReadabilityError;
use crate::options::Options;
use crate::util::Util;

/// The identified article content, still attached to its owning document.
pub(crate) struct Extracted {
    pub document: Document,
    pub content: Node,
    pub byline: Option<String>,
    pub dir: Option<String>,
}

struct Attempt {
    content: Node,
    text_length: usize,
    // The attempt's content only stays alive as long as its document does.
    document: Document,
}

pub(crate) struct Extractor;

impl Extractor {
    /// Run the scan/score/select/aggregate/clean pipeline on `document`,
    /// relaxing heuristic flags and retrying from a pristine copy whenever
    /// the result is shorter than the configured threshold.
    pub fn extract(
        document: Document,
        options: &Options,
        title: &str,
    ) -> Result<Option<Extracted>, ReadabilityError> {
        let mut state = State::default();
        let mut document = document;
        let mut attempts: Vec<Attempt> = Vec::new();
        let document_cache = document.dup().map_err(|()| ReadabilityError::Xml)?;

        loop {
            let root = document
                .get_root_element()
                .ok_or(ReadabilityError::Xml)?;
            let page =
                Util::get_first_element_by_tag_name(&root, "body").unwrap_or_else(|| root.clone());

            // Node prepping: trash nodes that look cruddy and turn divs into
            // p's where they have been used inappropriately.
            let mut elements_to_score = Vec::new();
            let mut node: Option<Node> = Some(root);

            while let Some(node_ref) = node.as_mut() {
                let tag_name = node_ref.get_name().to_uppercase();
                let match_string = format!(
                    "{} {}",
                    node_ref.get_attribute("class").unwrap_or_default(),
                    node_ref.get_attribute("id").unwrap_or_default()
                );

                if !Util::is_probably_visible(node_ref) {
                    log::debug!("Removing hidden node - {match_string}");
                    node = Util::remove_and_next(node_ref);
                    continue;
                }

                // Check to see if this node is a byline, and remove it if it is.
                if Self::check_byline(node_ref, &match_string, &mut state) {
                    node = Util::remove_and_next(node_ref);
                    continue;
                }

                // Remove unlikely candidates
                if state.strip_unlikely
                    && tag_name != "BODY"
                    && tag_name != "A"
                    && constants::UNLIKELY_CANDIDATES.is_match(&match_string)
                    && !constants::OKAY_MAYBE_ITS_A_CANDIDATE.is_match(&match_string)
                    && !Util::has_ancestor_tag(node_ref, "table", None, None::<fn(&Node) -> bool>)
                {
                    log::debug!("Removing unlikely candidate - {match_string}");
                    node = Util::remove_and_next(node_ref);
                    continue;
                }

                // Remove DIV, SECTION, and HEADER nodes without any content
                // (e.g. text, image, video, or iframe).
                if matches!(
                    tag_name.as_str(),
                    "DIV" | "SECTION" | "HEADER" | "H1" | "H2" | "H3" | "H4" | "H5" | "H6"
                ) && Util::is_element_without_content(node_ref)
                {
                    node = Util::remove_and_next(node_ref);
                    continue;
                }

                if constants::DEFAULT_TAGS_TO_SCORE.contains(&tag_name.as_str()) {
                    elements_to_score.push(node_ref.clone());
                }

                // Turn all divs that don't have children block level elements
                // into p's
                if tag_name == "DIV" {
                    Self::wrap_phrasing_runs(node_ref, &document)?;

                    // Sites that enclose each paragraph with a DIV element:
                    // DIVs with only a P element inside and no text content
                    // can be safely converted into plain P elements to avoid
                    // confusing the scoring algorithm.
                    if Util::has_single_tag_inside_element(node_ref, "P")
                        && Util::get_link_density(node_ref) < 0.25
                    {
                        if let (Some(new_node), Some(mut parent)) = (
                            node_ref.get_child_elements().first().cloned(),
                            node_ref.get_parent(),
                        ) {
                            parent
                                .replace_child_node(new_node.clone(), node_ref.clone())
                                .map_err(|error| {
                                    log::error!("{error}");
                                    ReadabilityError::Xml
                                })?;
                            elements_to_score.push(new_node.clone());
                            node = Util::next_node(&new_node, false);
                            continue;
                        }
                    } else if !Util::has_child_block_element(node_ref)
                        && node_ref.set_name("p").is_ok()
                    {
                        elements_to_score.push(node_ref.clone());
                    }
                }

                node = Util::next_node(node_ref, false);
            }

            // Loop through all paragraphs, and assign a score to them based
            // on how content-y they look. Then add their score to their
            // ancestor nodes.
            let mut candidates = Vec::new();
            for element_to_score in elements_to_score.drain(..) {
                if element_to_score.get_parent().is_none() {
                    continue;
                }

                let inner_text = Util::get_inner_text(&element_to_score, true);

                // If this paragraph is less than 25 characters, don't even
                // count it.
                if inner_text.len() < 25 {
                    continue;
                }

                // Exclude nodes with no ancestor.
                let ancestors = Util::get_node_ancestors(&element_to_score, Some(3));
                if ancestors.is_empty() {
                    continue;
                }

                let mut content_score = 0.0;

                // Add a point for the paragraph itself as a base.
                content_score += 1.0;

                // Add points for any commas within this paragraph.
                content_score += inner_text.split(',').count() as f64;

                // For every 100 characters in this paragraph, add another
                // point. Up to 3 points.
                content_score += f64::min(f64::floor(inner_text.len() as f64 / 100.0), 3.0);

                // Initialize and score ancestors.
                for (level, mut ancestor) in ancestors.into_iter().enumerate() {
                    if !Self::is_element(&ancestor)
                        || !ancestor.get_parent().as_ref().map(Self::is_element).unwrap_or(false)
                    {
                        continue;
                    }

                    if Self::get_content_score(&ancestor).is_none() {
                        Self::initialize_node(&mut ancestor, &state)?;
                        candidates.push(ancestor.clone());
                    }

                    // Node score divider:
                    // - parent:             1 (no division)
                    // - grandparent:        2
                    // - great grandparent+: ancestor level * 3
                    let score_divider = if level == 0 {
                        1.0
                    } else if level == 1 {
                        2.0
                    } else {
                        level as f64 * 3.0
                    };

                    if let Some(score) = Self::get_content_score(&ancestor) {
                        Self::set_content_score(&mut ancestor, score + content_score / score_divider)?;
                    }
                }
            }

            // After we've calculated scores, loop through all of the possible
            // candidate nodes we found and find the one with the highest
            // score, keeping a bounded descending-ordered list.
            let mut top_candidates: Vec<Node> = Vec::new();
            for mut candidate in candidates {
                let content_score = match Self::get_content_score(&candidate) {
                    Some(score) => score,
                    None => continue,
                };

                // Scale the final candidates score based on link density.
                // Good content should have a relatively small link density
                // (5% or less) and be mostly unaffected by this operation.
                let candidate_score = content_score * (1.0 - Util::get_link_density(&candidate));
                Self::set_content_score(&mut candidate, candidate_score)?;

                if options.debug {
                    log::debug!(
                        "Candidate: {} with score {candidate_score}",
                        candidate.get_name()
                    );
                }

                for slot in 0..options.nb_top_candidates {
                    let slot_score = top_candidates.get(slot).and_then(Self::get_content_score);
                    let wins_slot = match slot_score {
                        Some(score) => candidate_score > score,
                        None => true,
                    };

                    if wins_slot {
                        top_candidates.insert(slot, candidate.clone());
                        if top_candidates.len() > options.nb_top_candidates {
                            top_candidates.pop();
                        }
                        break;
                    }
                }
            }

            let mut needed_to_create_top_candidate = false;
            let best_candidate = top_candidates
                .first()
                .cloned()
                .filter(|candidate| candidate.get_name().to_uppercase() != "BODY");

            let mut top_candidate = if let Some(mut top_candidate) = best_candidate {
                let top_score = Self::get_content_score(&top_candidate).unwrap_or(0.0);

                // Find a better top candidate node if it contains (at least
                // three) nodes which belong to the candidate list and whose
                // scores are quite close to the current top candidate.
                let mut alternative_candidate_ancestors: Vec<Vec<Node>> = Vec::new();
                for candidate in top_candidates.iter().skip(1) {
                    let score = Self::get_content_score(candidate).unwrap_or(0.0);
                    if score / top_score >= 0.75 {
                        alternative_candidate_ancestors
                            .push(Util::get_node_ancestors(candidate, None));
                    }
                }

                if alternative_candidate_ancestors.len() >= constants::MINIMUM_TOPCANDIDATES {
                    let mut parent_of_top_candidate = top_candidate.get_parent();

                    while let Some(parent) = parent_of_top_candidate {
                        if parent.get_name().to_uppercase() == "BODY" {
                            break;
                        }

                        let lists_containing_this_ancestor = alternative_candidate_ancestors
                            .iter()
                            .filter(|ancestors| ancestors.contains(&parent))
                            .take(constants::MINIMUM_TOPCANDIDATES)
                            .count();

                        if lists_containing_this_ancestor >= constants::MINIMUM_TOPCANDIDATES {
                            top_candidate = parent;
                            break;
                        }

                        parent_of_top_candidate = parent.get_parent();
                    }
                }

                if Self::get_content_score(&top_candidate).is_none() {
                    Self::initialize_node(&mut top_candidate, &state)?;
                }

                // Because of our bonus system, parents of candidates might
                // have scores themselves. They get half of the node. There
                // won't be nodes with higher scores than our topCandidate,
                // but if we see the score going *up* in the first few steps
                // up the tree, that's a decent sign that there might be more
                // content lurking in other places that we want to unify in.
                // The sibling stuff below does some of that - but only if
                // we've looked high enough up the DOM tree.
                let mut parent_of_top_candidate = top_candidate.get_parent();
                let mut last_score = Self::get_content_score(&top_candidate).unwrap_or(0.0);

                // The scores shouldn't get too low.
                let score_threshold = last_score / 3.0;

                while let Some(parent) = parent_of_top_candidate {
                    if parent.get_name().to_uppercase() == "BODY" {
                        break;
                    }

                    let parent_score = match Self::get_content_score(&parent) {
                        Some(score) => score,
                        None => {
                            parent_of_top_candidate = parent.get_parent();
                            continue;
                        }
                    };

                    if parent_score < score_threshold {
                        break;
                    }

                    if parent_score > last_score {
                        // Alright! We found a better parent to use.
                        top_candidate = parent;
                        break;
                    }

                    last_score = parent_score;
                    parent_of_top_candidate = parent.get_parent();
                }

                // If the top candidate is the only child, use parent instead.
                // This will help sibling joining logic when adjacent content
                // is actually located in parent's sibling node.
                let mut parent_of_top_candidate = top_candidate.get_parent();
                while let Some(parent) = parent_of_top_candidate {
                    if parent.get_name().to_uppercase() == "BODY"
                        || parent.get_child_elements().len() != 1
                    {
                        break;
                    }

                    top_candidate = parent;
                    parent_of_top_candidate = top_candidate.get_parent();
                }

                if Self::get_content_score(&top_candidate).is_none() {
                    Self::initialize_node(&mut top_candidate, &state)?;
                }

                top_candidate
            } else {
                // If we still have no top candidate, just use the body as a
                // last resort. Move everything (not just elements, also text
                // nodes etc.) into a new container so we even include text
                // directly in the body.
                needed_to_create_top_candidate = true;
                let mut container =
                    Node::new("div", None, &document).map_err(|()| ReadabilityError::Xml)?;

                let mut page = page.clone();
                for mut kid in page.get_child_nodes() {
                    kid.unlink();
                    container.add_child(&mut kid).map_err(|error| {
                        log::error!("{error}");
                        ReadabilityError::Xml
                    })?;
                }
                page.add_child(&mut container).map_err(|error| {
                    log::error!("{error}");
                    ReadabilityError::Xml
                })?;

                Self::initialize_node(&mut container, &state)?;
                container
            };

            // Now that we have the top candidate, look through its siblings
            // for content that might also be related. Things like preambles,
            // content split by ads that we removed, etc.
            let mut article_content =
                Node::new("div", None, &document).map_err(|()| ReadabilityError::Xml)?;

            let top_score = Self::get_content_score(&top_candidate).unwrap_or(0.0);
            let sibling_score_threshold = f64::max(10.0, top_score * 0.2);

            // Keep the top candidate's parent node to try to get the text
            // direction of it later.
            let parent_of_top_candidate = top_candidate.get_parent();
            let siblings = parent_of_top_candidate
                .as_ref()
                .map(|parent| parent.get_child_elements())
                .unwrap_or_default();

            for mut sibling in siblings {
                let mut append = false;

                if options.debug {
                    log::debug!(
                        "Looking at sibling node {} with score {:?}",
                        sibling.get_name(),
                        Self::get_content_score(&sibling)
                    );
                }

                if sibling == top_candidate {
                    append = true;
                } else {
                    let mut content_bonus = 0.0;

                    // Give a bonus if sibling nodes and top candidates have
                    // the exact same classname
                    let sibling_class = sibling.get_attribute("class").unwrap_or_default();
                    let top_class = top_candidate.get_attribute("class").unwrap_or_default();
                    if !top_class.is_empty() && sibling_class == top_class {
                        content_bonus += top_score * 0.2;
                    }

                    if let Some(sibling_score) = Self::get_content_score(&sibling) {
                        if sibling_score + content_bonus >= sibling_score_threshold {
                            append = true;
                        }
                    }

                    if !append && sibling.get_name().to_uppercase() == "P" {
                        let link_density = Util::get_link_density(&sibling);
                        let node_content = Util::get_inner_text(&sibling, true);
                        let node_length = node_content.len();

                        if node_length > 80 && link_density < 0.25 {
                            append = true;
                        } else if node_length < 80
                            && node_length > 0
                            && link_density == 0.0
                            && constants::SIBLING_CONTENT.is_match(&node_content)
                        {
                            append = true;
                        }
                    }
                }

                if append {
                    log::debug!("Appending sibling node: {}", sibling.get_name());

                    if !constants::ALTER_TO_DIV_EXCEPTIONS
                        .contains(sibling.get_name().to_uppercase().as_str())
                    {
                        // We have a node that isn't a common block level
                        // element, like a form or td tag. Turn it into a div
                        // so it doesn't get filtered out later by accident.
                        if let Err(error) = sibling.set_name("div") {
                            log::warn!("Failed to alter sibling to div: {error}");
                        }
                    }

                    sibling.unlink();
                    article_content.add_child(&mut sibling).map_err(|error| {
                        log::error!("{error}");
                        ReadabilityError::Xml
                    })?;
                }
            }

            // So we have all of the content that we need. Now we clean it up
            // for presentation.
            clean::prep_article(&mut article_content, &document, &state, title)?;

            if needed_to_create_top_candidate {
                // We already created a fake div thing, and there wouldn't
                // have been any siblings left for the previous loop, so
                // there's no point trying to create a new div, and then move
                // all the children over. Just assign IDs and class names
                // here. No need to append because that already happened
                // anyway.
                let _ = top_candidate.set_attribute("id", constants::READABILITY_PAGE_ID);
                let _ = top_candidate.set_attribute("class", constants::READABILITY_PAGE_CLASS);
            } else {
                let mut div =
                    Node::new("div", None, &document).map_err(|()| ReadabilityError::Xml)?;
                let _ = div.set_attribute("id", constants::READABILITY_PAGE_ID);
                let _ = div.set_attribute("class", constants::READABILITY_PAGE_CLASS);

                for mut child in article_content.get_child_nodes() {
                    child.unlink();
                    div.add_child(&mut child).map_err(|error| {
                        log::error!("{error}");
                        ReadabilityError::Xml
                    })?;
                }
                article_content.add_child(&mut div).map_err(|error| {
                    log::error!("{error}");
                    ReadabilityError::Xml
                })?;
            }

            // Now that we've gone through the full algorithm, check to see
            // if we got any meaningful content. If we didn't, we may need to
            // re-run with different flags set. This gives us a higher
            // likelihood of finding the content, and the sieve approach
            // gives us a higher likelihood of finding the -right- content.
            let text_length = Util::get_inner_text(&article_content, true).len();

            if text_length >= options.char_threshold {
                let dir = Self::find_article_dir(parent_of_top_candidate.as_ref(), &top_candidate);
                return Ok(Some(Extracted {
                    document,
                    content: article_content,
                    byline: state.byline.take(),
                    dir,
                }));
            }

            // Undo this attempt's mutations and record it before relaxing
            // the next flag.
            attempts.push(Attempt {
                content: article_content,
                text_length,
                document,
            });
            document = document_cache.dup().map_err(|()| ReadabilityError::Xml)?;

            if state.strip_unlikely {
                state.strip_unlikely = false;
            } else if state.weigh_classes {
                state.weigh_classes = false;
            } else if state.clean_conditionally {
                state.clean_conditionally = false;
            } else {
                // No luck after relaxing all flags, just return the longest
                // text we found during the different attempts. The sort is
                // stable, so equal lengths keep relaxation order.
                let dir = Self::find_article_dir(parent_of_top_candidate.as_ref(), &top_candidate);
                attempts.sort_by(|a, b| b.text_length.cmp(&a.text_length));

                // But first check if we actually have something.
                return match attempts.into_iter().next() {
                    Some(best) if best.text_length > 0 => Ok(Some(Extracted {
                        document: best.document,
                        content: best.content,
                        byline: state.byline.take(),
                        dir,
                    })),
                    _ => Ok(None),
                };
            }
        }
    }

    // Merge runs of consecutive phrasing-content children of a div into
    // synthesized <p> wrappers.
    fn wrap_phrasing_runs(div: &mut Node, document: &Document) -> Result<(), ReadabilityError> {
        let mut p: Option<Node> = None;

        for mut child_node in div.get_child_nodes() {
            if Util::is_phrasing_content(&child_node) {
                if let Some(p) = p.as_mut() {
                    child_node.unlink();
                    p.add_child(&mut child_node).map_err(|error| {
                        log::error!("{error}");
                        ReadabilityError::Xml
                    })?;
                } else if !Util::is_whitespace(&child_node) {
                    let mut new_p =
                        Node::new("p", None, document).map_err(|()| ReadabilityError::Xml)?;
                    div.replace_child_node(new_p.clone(), child_node.clone())
                        .map_err(|error| {
                            log::error!("{error}");
                            ReadabilityError::Xml
                        })?;
                    new_p.add_child(&mut child_node).map_err(|error| {
                        log::error!("{error}");
                        ReadabilityError::Xml
                    })?;
                    p = Some(new_p);
                }
            } else if let Some(mut open_p) = p.take() {
                while let Some(mut last_child) = open_p.get_last_child() {
                    if Util::is_whitespace(&last_child) {
                        last_child.unlink();
                    } else {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn check_byline(node: &Node, match_string: &str, state: &mut State) -> bool {
        if state.byline.is_some() {
            return false;
        }

        let rel = node
            .get_attribute("rel")
            .map(|rel| rel == "author")
            .unwrap_or(false);
        let itemprop = node
            .get_attribute("itemprop")
            .map(|prop| prop.contains("author"))
            .unwrap_or(false);

        let content = node.get_content();
        if (rel || itemprop || constants::BYLINE.is_match(match_string))
            && Self::is_valid_byline(&content)
        {
            state.byline = Some(content.trim().into());
            true
        } else {
            false
        }
    }

    // Check whether the input string could be a byline: non-empty and
    // shorter than 100 chars.
    fn is_valid_byline(line: &str) -> bool {
        let len = line.trim().len();
        len > 0 && len < 100
    }

    // Initialize a node as a scoring candidate, seeding its score with the
    // per-tag bias and the class/id weight.
    fn initialize_node(node: &mut Node, state: &State) -> Result<(), ReadabilityError> {
        let score = match node.get_name().to_uppercase().as_str() {
            "DIV" => 5,
            "PRE" | "TD" | "BLOCKQUOTE" => 3,
            "ADDRESS" | "OL" | "UL" | "DL" | "DD" | "DT" | "LI" | "FORM" => -3,
            "H1" | "H2" | "H3" | "H4" | "H5" | "H6" | "TH" => -5,
            _ => 0,
        };
        let score = score + Util::get_class_weight(node, state.weigh_classes);
        Self::set_content_score(node, score as f64)
    }

    pub(crate) fn get_content_score(node: &Node) -> Option<f64> {
        node.get_attribute(constants::SCORE_ATTR)
            .and_then(|attr| attr.parse::<f64>().ok())
    }

    fn set_content_score(node: &mut Node, score: f64) -> Result<(), ReadabilityError> {
        node.set_attribute(constants::SCORE_ATTR, &score.to_string())
            .map_err(|error| {
                log::error!("Failed to set content score: {error}");
                ReadabilityError::Xml
            })
    }

    fn is_element(node: &Node) -> bool {
        node.get_type()
            .map(|t| t == NodeType::ElementNode)
            .unwrap_or(false)
    }

    // Find the text direction from the chosen container, its parent and the
    // parent's ancestors.
    fn find_article_dir(parent: Option<&Node>, top_candidate: &Node) -> Option<String> {
        let mut chain = vec![top_candidate.clone()];
        if let Some(parent) = parent {
            chain.push(parent.clone());
            chain.extend(Util::get_node_ancestors(parent, None));
        }

        for node in chain {
            if !Self::is_element(&node) {
                continue;
            }

            if let Some(dir) = node.get_attribute("dir") {
                if !dir.is_empty() {
                    return Some(dir);
                }
            }
        }

        None
    }
}
